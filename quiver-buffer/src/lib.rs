#![deny(missing_docs)]

//! Byte buffers for Quiver.
//!
//! Columnar data lives in [`ByteBuffer`]s: immutable, cheaply cloneable views over reference
//! counted memory. Slicing a buffer never copies. Buffers are assembled in a [`BufferMut`], which
//! is usually handed out by a [`BufferAllocator`] so that outstanding memory can be accounted for.

pub use allocator::*;
pub use bits::*;
pub use buffer::*;
pub use buffer_mut::*;

mod allocator;
mod bits;
mod buffer;
mod buffer_mut;
mod debug;
