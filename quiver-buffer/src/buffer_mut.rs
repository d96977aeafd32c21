use std::fmt::{Debug, Formatter};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::Bytes;

use crate::allocator::Ledger;
use crate::debug::TruncatedDebug;
use crate::ByteBuffer;

/// A growable byte buffer that is frozen into a [`ByteBuffer`] once filled.
///
/// The buffer keeps a write index (its length) separate from its capacity, so readers can append
/// into it in several steps. Buffers handed out by a [`crate::RootAllocator`] report their
/// capacity to the allocator until the frozen bytes are dropped.
pub struct BufferMut {
    bytes: Vec<u8>,
    ledger: Option<Arc<Ledger>>,
    reserved: usize,
}

impl BufferMut {
    /// Create an empty, unaccounted buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            ledger: None,
            reserved: 0,
        }
    }

    /// Create an empty, unaccounted buffer.
    pub fn empty() -> Self {
        Self::with_capacity(0)
    }

    /// Copy the provided bytes into a new, unaccounted buffer.
    pub fn copy_from(bytes: impl AsRef<[u8]>) -> Self {
        let mut buffer = Self::with_capacity(bytes.as_ref().len());
        buffer.extend_from_slice(bytes.as_ref());
        buffer
    }

    pub(crate) fn accounted(capacity: usize, ledger: Arc<Ledger>) -> Self {
        let bytes = Vec::with_capacity(capacity);
        let reserved = bytes.capacity();
        ledger.reserve(reserved);
        Self {
            bytes,
            ledger: Some(ledger),
            reserved,
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes the buffer can hold before reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Append a slice.
    pub fn extend_from_slice(&mut self, slice: &[u8]) {
        self.bytes.extend_from_slice(slice);
        self.sync_reservation();
    }

    /// Append `n` copies of `byte`.
    pub fn push_n(&mut self, byte: u8, n: usize) {
        self.bytes.resize(self.bytes.len() + n, byte);
        self.sync_reservation();
    }

    /// Grow the buffer by `n` zero bytes and return the newly added tail for writing.
    pub fn push_zeroed(&mut self, n: usize) -> &mut [u8] {
        let start = self.bytes.len();
        self.push_n(0, n);
        &mut self.bytes[start..]
    }

    /// Shorten the buffer to `len` bytes, keeping its capacity.
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Pad with zeros until the length is a multiple of `alignment`.
    pub fn align_to(&mut self, alignment: usize) {
        let padding = self.len().next_multiple_of(alignment) - self.len();
        self.push_n(0, padding);
    }

    /// Freeze into an immutable [`ByteBuffer`].
    ///
    /// The allocation is reused; accounted buffers release their reservation once every view over
    /// the frozen bytes has been dropped.
    pub fn freeze(mut self) -> ByteBuffer {
        let bytes = mem::take(&mut self.bytes);
        match self.ledger.take() {
            None => ByteBuffer::from(bytes),
            Some(ledger) => {
                let reserved = mem::take(&mut self.reserved);
                ByteBuffer::from(Bytes::from_owner(Allocation {
                    bytes,
                    ledger,
                    reserved,
                }))
            }
        }
    }

    fn sync_reservation(&mut self) {
        if let Some(ledger) = &self.ledger {
            let capacity = self.bytes.capacity();
            if capacity > self.reserved {
                ledger.reserve(capacity - self.reserved);
                self.reserved = capacity;
            }
        }
    }
}

impl Drop for BufferMut {
    fn drop(&mut self) {
        if let Some(ledger) = &self.ledger {
            ledger.release(self.reserved);
        }
    }
}

impl Default for BufferMut {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for BufferMut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferMut")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("bytes", &TruncatedDebug(&self.bytes))
            .finish()
    }
}

impl Deref for BufferMut {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl DerefMut for BufferMut {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bytes
    }
}

/// Owner of frozen, accounted memory. Dropped when the last [`Bytes`] view goes away.
struct Allocation {
    bytes: Vec<u8>,
    ledger: Arc<Ledger>,
    reserved: usize,
}

impl AsRef<[u8]> for Allocation {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        self.ledger.release(self.reserved);
    }
}
