//! Framing and encoding of individual IPC messages.
//!
//! The [`MessageEncoder`] turns schemas and batches into a flatbuffer header plus body buffers,
//! and the [`MessageWriter`] frames them onto a channel. On the way back, the [`MessageReader`]
//! splits a channel into [`MessageMetadata`] and bodies, and the [`MessageDecoder`] rebuilds the
//! in-memory message.

mod decoder;
mod encoder;
mod reader;
mod writer;

pub use decoder::*;
pub use encoder::*;
pub use reader::*;
pub use writer::*;

/// Marks the start of a message in the current framing.
pub const CONTINUATION_MARKER: u32 = 0xFFFF_FFFF;
