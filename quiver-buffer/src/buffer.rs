use std::fmt::{Debug, Formatter};
use std::ops::{Deref, RangeBounds};

use bytes::Bytes;
use quiver_error::{QuiverResult, quiver_bail};

use crate::debug::TruncatedDebug;

/// An immutable, reference-counted byte buffer.
///
/// Cloning and slicing share the underlying allocation. The memory is released once the last
/// view over it is dropped.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ByteBuffer(Bytes);

impl ByteBuffer {
    /// Create an empty buffer. Does not allocate.
    pub const fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Copy the provided bytes into a new buffer.
    pub fn copy_from(bytes: impl AsRef<[u8]>) -> Self {
        Self(Bytes::copy_from_slice(bytes.as_ref()))
    }

    /// Create a buffer of `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self(Bytes::from(vec![0u8; len]))
    }

    /// Wrap a static byte slice without copying.
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }

    /// Length of the buffer in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer holds no bytes.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The buffer contents.
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns a zero-copy view over `range`.
    ///
    /// ## Panics
    ///
    /// Panics if the range is out of bounds. Use [`ByteBuffer::try_slice`] for untrusted ranges.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        Self(self.0.slice(range))
    }

    /// Returns a zero-copy view over `len` bytes starting at `offset`, or an error when the range
    /// does not fit inside this buffer.
    pub fn try_slice(&self, offset: usize, len: usize) -> QuiverResult<Self> {
        let Some(end) = offset.checked_add(len) else {
            quiver_bail!(OutOfBounds: offset, 0, self.len());
        };
        if end > self.len() {
            quiver_bail!(OutOfBounds: end, 0, self.len());
        }
        Ok(self.slice(offset..end))
    }

    /// Returns the first `len` bytes, or the whole buffer when it is shorter.
    pub fn prefix(&self, len: usize) -> Self {
        self.slice(..len.min(self.len()))
    }

    /// Number of bytes the buffer occupies once padded to a multiple of `alignment`.
    pub fn padded_len(&self, alignment: usize) -> usize {
        self.len().next_multiple_of(alignment)
    }

    /// The underlying [`Bytes`].
    pub fn inner(&self) -> &Bytes {
        &self.0
    }

    /// Unwrap into the underlying [`Bytes`].
    pub fn into_inner(self) -> Bytes {
        self.0
    }
}

impl Debug for ByteBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.len())
            .field("bytes", &TruncatedDebug(self.as_slice()))
            .finish()
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for ByteBuffer {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<ByteBuffer> for Bytes {
    fn from(buffer: ByteBuffer) -> Self {
        buffer.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_share_memory() {
        let buffer = ByteBuffer::copy_from([1u8, 2, 3, 4, 5, 6]);
        let slice = buffer.slice(2..5);
        assert_eq!(slice.as_slice(), &[3, 4, 5]);
        assert_eq!(
            slice.as_slice().as_ptr(),
            buffer.as_slice()[2..].as_ptr(),
            "slice must not copy"
        );
    }

    #[test]
    fn try_slice_checks_bounds() {
        let buffer = ByteBuffer::zeroed(8);
        assert_eq!(buffer.try_slice(4, 4).unwrap().len(), 4);
        assert!(buffer.try_slice(4, 5).is_err());
        assert!(buffer.try_slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn padded_len_rounds_up() {
        assert_eq!(ByteBuffer::zeroed(0).padded_len(8), 0);
        assert_eq!(ByteBuffer::zeroed(3).padded_len(8), 8);
        assert_eq!(ByteBuffer::zeroed(16).padded_len(8), 16);
    }
}
