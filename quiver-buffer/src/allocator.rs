use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use quiver_error::{QuiverResult, quiver_bail};

use crate::BufferMut;

/// Source of writable buffers for decoded message bodies.
pub trait BufferAllocator: Debug + Send + Sync {
    /// Allocate an empty buffer with room for `len` bytes.
    fn allocate(&self, len: usize) -> QuiverResult<BufferMut>;

    /// Bytes currently held by buffers from this allocator, frozen or not.
    fn allocated_bytes(&self) -> usize;
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    allocated: AtomicUsize,
    peak: AtomicUsize,
}

impl Ledger {
    pub(crate) fn reserve(&self, len: usize) {
        let now = self.allocated.fetch_add(len, Ordering::AcqRel) + len;
        self.peak.fetch_max(now, Ordering::AcqRel);
    }

    pub(crate) fn release(&self, len: usize) {
        self.allocated.fetch_sub(len, Ordering::AcqRel);
    }
}

/// An allocator that tracks how many bytes it has outstanding.
///
/// Clones share one ledger. An optional limit rejects allocations that would push the outstanding
/// total past it; growth of an already-allocated buffer is accounted but never rejected.
#[derive(Debug, Clone)]
pub struct RootAllocator {
    ledger: Arc<Ledger>,
    limit: Option<usize>,
}

impl RootAllocator {
    /// An allocator without a limit.
    pub fn new() -> Self {
        Self {
            ledger: Arc::default(),
            limit: None,
        }
    }

    /// An allocator that refuses to hold more than `limit` bytes at once.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            ledger: Arc::default(),
            limit: Some(limit),
        }
    }

    /// Highest number of bytes held at any one time.
    pub fn peak_bytes(&self) -> usize {
        self.ledger.peak.load(Ordering::Acquire)
    }
}

impl Default for RootAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferAllocator for RootAllocator {
    fn allocate(&self, len: usize) -> QuiverResult<BufferMut> {
        if let Some(limit) = self.limit {
            let outstanding = self.allocated_bytes();
            if outstanding.saturating_add(len) > limit {
                quiver_bail!(
                    InvalidArgument: "allocating {len} bytes would exceed the {limit} byte limit ({outstanding} outstanding)"
                );
            }
        }
        log::trace!("allocating {len} bytes");
        Ok(BufferMut::accounted(len, Arc::clone(&self.ledger)))
    }

    fn allocated_bytes(&self) -> usize {
        self.ledger.allocated.load(Ordering::Acquire)
    }
}
