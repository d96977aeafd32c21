//! Flatbuffer bindings for the Arrow IPC metadata, plus the traits Quiver types implement to move
//! in and out of them.
//!
//! The bindings are maintained by hand and cover the tables the stream and file formats use. Union
//! tags, vtable slots and struct layouts follow the upstream Arrow schema files reproduced below,
//! so metadata written here can be read by any Arrow implementation and vice versa.

#[macro_use]
mod macros;

#[allow(clippy::all)]
#[allow(clippy::derive_partial_eq_without_eq)]
#[allow(missing_docs)]
#[allow(non_camel_case_types)]
#[allow(unused_lifetimes)]
/// Schema, field and type metadata.
///
/// `Schema.fbs`:
/// ```flatbuffers
#[doc = include_str!("../flatbuffers/arrow/Schema.fbs")]
/// ```
pub mod schema;

#[allow(clippy::all)]
#[allow(clippy::derive_partial_eq_without_eq)]
#[allow(missing_docs)]
#[allow(unused_lifetimes)]
/// The message envelope and the record batch and dictionary batch headers.
///
/// `Message.fbs`:
/// ```flatbuffers
#[doc = include_str!("../flatbuffers/arrow/Message.fbs")]
/// ```
pub mod message;

#[allow(clippy::all)]
#[allow(clippy::derive_partial_eq_without_eq)]
#[allow(missing_docs)]
#[allow(unused_lifetimes)]
/// The file footer and its block index.
///
/// `File.fbs`:
/// ```flatbuffers
#[doc = include_str!("../flatbuffers/arrow/File.fbs")]
/// ```
pub mod file;

use flatbuffers::{FlatBufferBuilder, Follow, InvalidFlatbuffer, Verifiable, WIPOffset, root};
use quiver_buffer::ByteBuffer;

/// Marker for types that are serialized as the root of their own flatbuffer.
pub trait FlatBufferRoot {}

/// Decoding from a verified flatbuffer table.
pub trait ReadFlatBuffer: Sized {
    /// The flatbuffer table this type reads from.
    type Source<'a>: Verifiable + Follow<'a>;
    /// Error returned for verification or semantic failures.
    type Error: From<InvalidFlatbuffer>;

    /// Decode from an already verified table.
    fn read_flatbuffer<'buf>(
        fb: &<Self::Source<'buf> as Follow<'buf>>::Inner,
    ) -> Result<Self, Self::Error>;

    /// Verify `bytes` as a root of [`Self::Source`] and decode it.
    fn read_flatbuffer_bytes<'buf>(bytes: &'buf [u8]) -> Result<Self, Self::Error>
    where
        <Self as ReadFlatBuffer>::Source<'buf>: 'buf,
    {
        let fb = root::<Self::Source<'buf>>(bytes)?;
        Self::read_flatbuffer(&fb)
    }
}

/// Encoding into a flatbuffer builder.
pub trait WriteFlatBuffer {
    /// The flatbuffer table this type writes.
    type Target<'a>;

    /// Write `self` into `fbb`, returning the offset of the finished table.
    fn write_flatbuffer<'fb>(&self, fbb: &mut FlatBufferBuilder<'fb>) -> WIPOffset<Self::Target<'fb>>;
}

/// Serializes root types into standalone buffers.
pub trait WriteFlatBufferExt: WriteFlatBuffer + FlatBufferRoot {
    /// Write the flatbuffer into a [`ByteBuffer`] without a size prefix.
    fn write_flatbuffer_bytes(&self) -> ByteBuffer;
}

impl<F: WriteFlatBuffer + FlatBufferRoot> WriteFlatBufferExt for F {
    fn write_flatbuffer_bytes(&self) -> ByteBuffer {
        let mut fbb = FlatBufferBuilder::new();
        let root_offset = self.write_flatbuffer(&mut fbb);
        fbb.finish_minimal(root_offset);
        let (vec, start) = fbb.collapse();
        ByteBuffer::from(vec).slice(start..)
    }
}

#[cfg(test)]
mod tests {
    use flatbuffers::FlatBufferBuilder;

    use crate::file::{Block, Footer, FooterArgs, root_as_footer};
    use crate::message::{
        FieldNode, Message, MessageArgs, MessageHeader, RecordBatch, RecordBatchArgs,
        root_as_message,
    };
    use crate::schema::{Buffer, MetadataVersion};

    #[test]
    fn record_batch_message() {
        let mut fbb = FlatBufferBuilder::new();
        let nodes = fbb.create_vector(&[FieldNode::new(16, 8)]);
        let buffers = fbb.create_vector(&[Buffer::new(0, 2), Buffer::new(8, 16)]);
        let batch = RecordBatch::create(
            &mut fbb,
            &RecordBatchArgs {
                length: 16,
                nodes: Some(nodes),
                buffers: Some(buffers),
            },
        );
        let message = Message::create(
            &mut fbb,
            &MessageArgs {
                version: MetadataVersion::V5,
                header_type: MessageHeader::RecordBatch,
                header: Some(batch.as_union_value()),
                body_length: 24,
                custom_metadata: None,
            },
        );
        fbb.finish_minimal(message);

        let message = root_as_message(fbb.finished_data()).unwrap();
        assert_eq!(message.version(), MetadataVersion::V5);
        assert_eq!(message.body_length(), 24);
        assert!(message.header_as_schema().is_none());
        let batch = message.header_as_record_batch().unwrap();
        assert_eq!(batch.length(), 16);
        let node = batch.nodes().unwrap().get(0);
        assert_eq!((node.length(), node.null_count()), (16, 8));
        let buffers = batch.buffers().unwrap();
        assert_eq!(buffers.len(), 2);
        assert_eq!((buffers.get(1).offset(), buffers.get(1).length()), (8, 16));
        assert!(batch.compression().is_none());
    }

    #[test]
    fn footer_blocks() {
        let mut fbb = FlatBufferBuilder::new();
        let records = fbb.create_vector(&[Block::new(8, 200, 64), Block::new(272, 136, 8)]);
        let footer = Footer::create(
            &mut fbb,
            &FooterArgs {
                version: MetadataVersion::V5,
                schema: None,
                dictionaries: None,
                record_batches: Some(records),
                custom_metadata: None,
            },
        );
        fbb.finish_minimal(footer);

        let footer = root_as_footer(fbb.finished_data()).unwrap();
        assert!(footer.dictionaries().is_none());
        let blocks = footer.record_batches().unwrap();
        assert_eq!(blocks.len(), 2);
        let second = blocks.get(1);
        assert_eq!(
            (second.offset(), second.meta_data_length(), second.body_length()),
            (272, 136, 8)
        );
    }

    #[test]
    fn unknown_enum_values_are_kept() {
        assert_eq!(format!("{:?}", MessageHeader(42)), "<UNKNOWN 42>");
        assert_eq!(MessageHeader(3), MessageHeader::RecordBatch);
    }
}
