//! Read and write Arrow IPC files.
//!
//! A file is a stream wrapped in magic bytes, with an index of every message appended after the
//! end-of-stream marker so readers can seek straight to any record batch.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ "ARROW1" + 2 bytes padding   │
//! ├──────────────────────────────┤
//! │ schema message               │
//! │ dictionary batch messages    │
//! │ record batch messages        │
//! │ end-of-stream marker         │
//! ├──────────────────────────────┤
//! │ footer flatbuffer            │
//! │ footer length (i32 LE)       │
//! │ "ARROW1"                     │
//! └──────────────────────────────┘
//! ```
//!
//! The footer repeats the schema and lists a block (offset, metadata length, body length) for
//! every dictionary batch and every record batch.

mod footer;
mod reader;
mod writer;

pub use footer::*;
pub use reader::*;
pub use writer::*;

/// The bytes at both ends of an Arrow file.
pub const MAGIC: [u8; 6] = *b"ARROW1";

/// Bytes taken by the leading magic and its padding.
pub const HEADER_SIZE: usize = 8;

/// The smallest possible file: both magics and the footer length.
pub const MIN_FILE_SIZE: u64 = (MAGIC.len() * 2 + 4) as u64;
