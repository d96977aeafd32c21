//! Arrow IPC messages and the readers and writers built on them.
//!
//! A message is a flatbuffer header followed by a body of 8-byte aligned buffers. This crate
//! holds the in-memory forms of those messages ([`ArrowRecordBatch`], [`ArrowDictionaryBatch`]),
//! the codec between them and the wire, the framing that delimits them on a byte channel, and the
//! stream container that sequences schema, dictionary and record batch messages. The file
//! container in `quiver-file` shares the writer and reader cores defined here.

pub mod dictionary;
pub mod loader;
pub mod messages;
pub mod stream;
mod batch;
mod options;
mod reader;
mod writer;

pub use batch::*;
pub use options::*;
pub use reader::*;
pub use writer::*;
