use std::fmt::{Display, Formatter};

use itertools::Itertools;
use quiver_buffer::ByteBuffer;
use quiver_dtype::Schema;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_flatbuffers::ReadFlatBuffer;
use quiver_flatbuffers::message as fb;

use crate::messages::MessageMetadata;
use crate::{ArrowDictionaryBatch, ArrowFieldNode, ArrowRecordBatch};

/// A message decoded from an IPC stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderMessage {
    /// A schema, still in message format.
    Schema(Schema),
    RecordBatch(ArrowRecordBatch),
    DictionaryBatch(ArrowDictionaryBatch),
}

impl Display for DecoderMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderMessage::Schema(_) => write!(f, "schema"),
            DecoderMessage::RecordBatch(batch) => {
                write!(f, "record batch of {} rows", batch.length())
            }
            DecoderMessage::DictionaryBatch(batch) => {
                write!(f, "dictionary batch for id {}", batch.id())
            }
        }
    }
}

/// Rebuilds in-memory messages from their metadata and body.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a message. Record batch buffers are zero-copy slices of `body`.
    pub fn decode(
        &self,
        metadata: &MessageMetadata,
        body: ByteBuffer,
    ) -> QuiverResult<DecoderMessage> {
        if body.len() as u64 != metadata.body_length() {
            quiver_bail!(
                TruncatedStream: "body holds {} bytes, the header declares {}",
                body.len(),
                metadata.body_length()
            );
        }

        let message = metadata.message();
        match message.header_type() {
            fb::MessageHeader::Schema => {
                let schema = message
                    .header_as_schema()
                    .ok_or_else(|| quiver_err!(InvalidSerde: "schema message without a header"))?;
                Ok(DecoderMessage::Schema(Schema::read_flatbuffer(&schema)?))
            }
            fb::MessageHeader::RecordBatch => {
                let batch = message.header_as_record_batch().ok_or_else(
                    || quiver_err!(InvalidSerde: "record batch message without a header"),
                )?;
                Ok(DecoderMessage::RecordBatch(decode_record_batch(&batch, &body)?))
            }
            fb::MessageHeader::DictionaryBatch => {
                let dictionary = message.header_as_dictionary_batch().ok_or_else(
                    || quiver_err!(InvalidSerde: "dictionary batch message without a header"),
                )?;
                let data = dictionary.data().ok_or_else(|| {
                    quiver_err!(
                        InvalidSerde: "dictionary batch {} carries no data",
                        dictionary.id()
                    )
                })?;
                Ok(DecoderMessage::DictionaryBatch(ArrowDictionaryBatch::new(
                    dictionary.id(),
                    decode_record_batch(&data, &body)?,
                    dictionary.is_delta(),
                )))
            }
            other => quiver_bail!(
                NotImplemented: "message header {} is not supported",
                other.variant_name().unwrap_or("unknown")
            ),
        }
    }
}

fn decode_record_batch(
    batch: &fb::RecordBatch,
    body: &ByteBuffer,
) -> QuiverResult<ArrowRecordBatch> {
    if batch.compression().is_some() {
        quiver_bail!(NotImplemented: "compressed record batches are not supported");
    }
    let length = usize::try_from(batch.length()).map_err(
        |_| quiver_err!(InvalidSerde: "negative record batch length {}", batch.length()),
    )?;
    let nodes: Vec<ArrowFieldNode> = batch
        .nodes()
        .unwrap_or_default()
        .iter()
        .map(|node| ArrowFieldNode::try_from_wire(node.length(), node.null_count()))
        .try_collect()?;
    let buffers: Vec<ByteBuffer> = batch
        .buffers()
        .unwrap_or_default()
        .iter()
        .map(|buffer| -> QuiverResult<ByteBuffer> {
            let (offset, length) = (buffer.offset(), buffer.length());
            let range = usize::try_from(offset)
                .ok()
                .zip(usize::try_from(length).ok())
                .and_then(|(offset, length)| Some(offset..offset.checked_add(length)?))
                .filter(|range| range.end <= body.len())
                .ok_or_else(|| {
                    quiver_err!(
                        Framing: "buffer at {} of {} bytes lies outside a body of {} bytes",
                        offset,
                        length,
                        body.len()
                    )
                })?;
            Ok(body.slice(range))
        })
        .try_collect()?;
    Ok(ArrowRecordBatch::new(length, nodes, buffers))
}
