//! Arrow IPC for Rust: write columnar record batches to a byte stream or a file and read them
//! back with their exact in-memory layout.
//!
//! ```no_run
//! use std::io::Cursor;
//!
//! use quiver::dictionary::MapDictionaryProvider;
//! use quiver::stream::{StreamReader, StreamWriter};
//! use quiver::{IpcOptions, Vector, VectorSchemaRoot};
//!
//! # fn main() -> quiver::error::QuiverResult<()> {
//! let root = VectorSchemaRoot::try_new(vec![Vector::primitive("x", [Some(1i32), None])])?;
//! let provider = MapDictionaryProvider::new();
//! let mut writer = StreamWriter::try_new(
//!     Vec::new(),
//!     root.schema().clone(),
//!     &provider,
//!     IpcOptions::default(),
//! )?;
//! writer.start()?;
//! writer.write_batch(&root, &provider)?;
//! let bytes = writer.finish()?;
//!
//! let mut reader = StreamReader::try_new(Cursor::new(bytes), IpcOptions::default())?;
//! let mut dictionaries = reader.dictionary_provider();
//! let mut loaded = VectorSchemaRoot::create(reader.schema().clone());
//! while reader.load_next_batch(&mut loaded, &mut dictionaries)? {
//!     assert_eq!(loaded.row_count(), 2);
//! }
//! # Ok(())
//! # }
//! ```

pub use quiver_ipc::*;
pub use quiver_vector::*;
#[cfg(feature = "files")]
pub use quiver_file as file;
pub use {
    quiver_buffer as buffer, quiver_dtype as dtype, quiver_error as error,
    quiver_flatbuffers as flatbuffers, quiver_io as io,
};
