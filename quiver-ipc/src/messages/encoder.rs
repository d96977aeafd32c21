use std::fmt::Display;

use flatbuffers::{FlatBufferBuilder, WIPOffset};
use itertools::Itertools;
use quiver_buffer::ByteBuffer;
use quiver_dtype::Schema;
use quiver_error::{QuiverResult, quiver_err};
use quiver_flatbuffers::WriteFlatBuffer;
use quiver_flatbuffers::message as fb;
use quiver_flatbuffers::schema::{Buffer, MetadataVersion};

use crate::{ArrowDictionaryBatch, ArrowRecordBatch, IpcOptions};

/// An IPC message ready to be passed to the encoder.
#[derive(Debug, Clone, Copy)]
pub enum EncoderMessage<'a> {
    /// A schema, already in message format.
    Schema(&'a Schema),
    RecordBatch(&'a ArrowRecordBatch),
    DictionaryBatch(&'a ArrowDictionaryBatch),
}

/// The flatbuffer header of a message and the buffers of its body.
#[derive(Debug, Clone)]
pub struct EncodedMessage {
    /// The serialized `Message` table, unpadded.
    pub metadata: ByteBuffer,
    /// Body buffers in layout order. Each is padded to 8 bytes when written.
    pub body: Vec<ByteBuffer>,
    /// Sum of the padded body buffer lengths, as recorded in the header.
    pub body_length: u64,
}

#[derive(Debug, Clone)]
pub struct MessageEncoder {
    version: MetadataVersion,
}

impl Default for MessageEncoder {
    fn default() -> Self {
        Self::new(&IpcOptions::default())
    }
}

impl MessageEncoder {
    pub fn new(options: &IpcOptions) -> Self {
        Self {
            version: options.metadata_version,
        }
    }

    /// Encode an IPC message for writing to a byte stream.
    pub fn encode(&self, message: EncoderMessage) -> QuiverResult<EncodedMessage> {
        let mut fbb = FlatBufferBuilder::new();

        let (header_type, header, body, body_length) = match message {
            EncoderMessage::Schema(schema) => (
                fb::MessageHeader::Schema,
                schema.write_flatbuffer(&mut fbb).as_union_value(),
                vec![],
                0,
            ),
            EncoderMessage::RecordBatch(batch) => (
                fb::MessageHeader::RecordBatch,
                write_record_batch(&mut fbb, batch)?.as_union_value(),
                batch.buffers().to_vec(),
                batch.compute_body_length(),
            ),
            EncoderMessage::DictionaryBatch(dictionary) => {
                let data = write_record_batch(&mut fbb, dictionary.data())?;
                let header = fb::DictionaryBatch::create(
                    &mut fbb,
                    &fb::DictionaryBatchArgs {
                        id: dictionary.id(),
                        data: Some(data),
                        is_delta: dictionary.is_delta(),
                    },
                );
                (
                    fb::MessageHeader::DictionaryBatch,
                    header.as_union_value(),
                    dictionary.data().buffers().to_vec(),
                    dictionary.data().compute_body_length(),
                )
            }
        };

        let message = fb::Message::create(
            &mut fbb,
            &fb::MessageArgs {
                version: self.version,
                header_type,
                header: Some(header),
                body_length: i64::try_from(body_length)
                    .map_err(|_| quiver_err!(Framing: "body of {} bytes overflows", body_length))?,
                custom_metadata: None,
            },
        );
        fbb.finish_minimal(message);
        let (vec, start) = fbb.collapse();

        Ok(EncodedMessage {
            metadata: ByteBuffer::from(vec).slice(start..),
            body,
            body_length,
        })
    }
}

fn write_record_batch<'fb>(
    fbb: &mut FlatBufferBuilder<'fb>,
    batch: &ArrowRecordBatch,
) -> QuiverResult<WIPOffset<fb::RecordBatch<'fb>>> {
    let nodes: Vec<fb::FieldNode> = batch
        .nodes()
        .iter()
        .map(|node| -> QuiverResult<fb::FieldNode> {
            Ok(fb::FieldNode::new(
                wire_length(node.length())?,
                wire_length(node.null_count())?,
            ))
        })
        .try_collect()?;
    let buffers: Vec<Buffer> = batch
        .buffer_layout()
        .iter()
        .map(|layout| -> QuiverResult<Buffer> {
            Ok(Buffer::new(
                wire_length(layout.offset)?,
                wire_length(layout.length)?,
            ))
        })
        .try_collect()?;
    let nodes = fbb.create_vector(&nodes);
    let buffers = fbb.create_vector(&buffers);
    Ok(fb::RecordBatch::create(
        fbb,
        &fb::RecordBatchArgs {
            length: wire_length(batch.length())?,
            nodes: Some(nodes),
            buffers: Some(buffers),
        },
    ))
}

fn wire_length<T: TryInto<i64> + Copy + Display>(value: T) -> QuiverResult<i64> {
    value
        .try_into()
        .map_err(|_| quiver_err!(Framing: "{} does not fit a signed 64-bit length", value))
}
