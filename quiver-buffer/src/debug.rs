use std::fmt::{Debug, Formatter};

/// Debug-prints at most the first few elements of a slice.
pub(crate) struct TruncatedDebug<'a, T>(pub(crate) &'a [T]);

impl<T: Debug> Debug for TruncatedDebug<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        const LIMIT: usize = 32;
        let mut list = f.debug_list();
        list.entries(self.0.iter().take(LIMIT));
        if self.0.len() > LIMIT {
            list.finish_non_exhaustive()
        } else {
            list.finish()
        }
    }
}
