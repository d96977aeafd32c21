//! The stream container: a schema message, then dictionary and record batches in any order,
//! then an end-of-stream marker. Streams are read front to back.

mod reader;
mod writer;

pub use reader::*;
pub use writer::*;
