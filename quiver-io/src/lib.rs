//! Blocking byte channels.
//!
//! The IPC stream format runs over anything implementing [`std::io::Read`] or
//! [`std::io::Write`]; the file format additionally needs [`std::io::Seek`]. The channels here
//! count the bytes that pass through them so the framing layer can compute offsets and padding
//! without asking the underlying sink.

pub use read::*;
pub use write::*;

mod read;
mod write;

/// Alignment, in bytes, of every message and body buffer boundary.
pub const ALIGNMENT: usize = 8;

/// Largest piece a channel reads in one step, so a declared length never sizes an allocation
/// before the bytes behind it have arrived.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;
