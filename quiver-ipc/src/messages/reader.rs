use std::io::Read;
use std::sync::Arc;

use flatbuffers::root_unchecked;
use quiver_buffer::{BufferAllocator, ByteBuffer, RootAllocator};
use quiver_dtype::Schema;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_flatbuffers::message as fb;
use quiver_flatbuffers::schema::MetadataVersion;
use quiver_io::{READ_CHUNK_SIZE, ReadChannel};

use crate::messages::{CONTINUATION_MARKER, DecoderMessage, MessageDecoder};
use crate::{ArrowRecordBatch, IpcOptions};

/// The framed header of one message: its verified flatbuffer and the lengths it declares.
#[derive(Debug, Clone)]
pub struct MessageMetadata {
    buffer: ByteBuffer,
    metadata_length: usize,
    body_length: u64,
    header_type: fb::MessageHeader,
    version: MetadataVersion,
}

impl MessageMetadata {
    /// Verify `buffer` as a `Message` flatbuffer. `metadata_length` is the size of the whole
    /// frame in front of the body.
    pub fn try_new(buffer: ByteBuffer, metadata_length: usize) -> QuiverResult<Self> {
        let message = fb::root_as_message(&buffer)?;
        let version = message.version();
        if !matches!(version, MetadataVersion::V4 | MetadataVersion::V5) {
            quiver_bail!(
                NotImplemented: "metadata version {} is not supported",
                version.variant_name().unwrap_or("unknown")
            );
        }
        let body_length = u64::try_from(message.body_length()).map_err(
            |_| quiver_err!(Framing: "negative body length {}", message.body_length()),
        )?;
        let header_type = message.header_type();
        Ok(Self {
            buffer,
            metadata_length,
            body_length,
            header_type,
            version,
        })
    }

    /// The message table.
    pub fn message(&self) -> fb::Message<'_> {
        // SAFETY: the buffer was verified in `try_new` and is immutable.
        unsafe { root_unchecked::<fb::Message>(&self.buffer) }
    }

    /// Size of the framing prefix, the metadata and its padding.
    #[inline]
    pub fn metadata_length(&self) -> usize {
        self.metadata_length
    }

    #[inline]
    pub fn body_length(&self) -> u64 {
        self.body_length
    }

    #[inline]
    pub fn header_type(&self) -> fb::MessageHeader {
        self.header_type
    }

    #[inline]
    pub fn version(&self) -> MetadataVersion {
        self.version
    }
}

/// Splits a byte channel into framed messages.
#[derive(Debug)]
pub struct MessageReader<R> {
    channel: ReadChannel<R>,
    options: IpcOptions,
    allocator: Arc<dyn BufferAllocator>,
    decoder: MessageDecoder,
}

impl<R: Read> MessageReader<R> {
    pub fn new(read: R, options: IpcOptions) -> Self {
        Self::with_allocator(read, options, Arc::new(RootAllocator::new()))
    }

    /// A reader whose message bodies are allocated from `allocator`.
    pub fn with_allocator(
        read: R,
        options: IpcOptions,
        allocator: Arc<dyn BufferAllocator>,
    ) -> Self {
        Self {
            channel: ReadChannel::new(read),
            options,
            allocator,
            decoder: MessageDecoder,
        }
    }

    /// Read the next message header, or `None` at the end of the stream.
    ///
    /// The end of the stream is a zero length, or the input ending cleanly where a message would
    /// start.
    pub fn read_next(&mut self) -> QuiverResult<Option<MessageMetadata>> {
        let Some(first) = self.read_prefix_word(true)? else {
            return Ok(None);
        };

        let length = if self.options.legacy_format {
            i32::from_le_bytes(first)
        } else {
            match u32::from_le_bytes(first) {
                CONTINUATION_MARKER => self
                    .read_prefix_word(false)?
                    .map(i32::from_le_bytes)
                    .unwrap_or_default(),
                0 => 0,
                other => quiver_bail!(
                    Framing: "expected continuation marker, found {:#010x}",
                    other
                ),
            }
        };
        if length == 0 {
            log::debug!("read end of stream at {}", self.channel.bytes_read());
            return Ok(None);
        }
        let length = usize::try_from(length)
            .map_err(|_| quiver_err!(Framing: "negative metadata length {}", length))?;

        let prefix = self.options.prefix_length();
        if (prefix + length) % 8 != 0 {
            quiver_bail!(
                Framing: "metadata of {} bytes after a {} byte prefix is not 8-byte aligned",
                length,
                prefix
            );
        }

        let buffer = self.read_exact(length, "message metadata")?;
        let metadata = MessageMetadata::try_new(buffer, prefix + length)?;
        log::debug!(
            "read {} message, metadata {} bytes, body {} bytes",
            metadata.header_type().variant_name().unwrap_or("unknown"),
            metadata.metadata_length(),
            metadata.body_length()
        );
        Ok(Some(metadata))
    }

    /// Read the body that follows `metadata`.
    pub fn read_body(&mut self, metadata: &MessageMetadata) -> QuiverResult<ByteBuffer> {
        let length = usize::try_from(metadata.body_length()).map_err(|_| {
            quiver_err!(Framing: "body of {} bytes does not fit memory", metadata.body_length())
        })?;
        self.read_exact(length, "message body")
    }

    /// Read and decode the next message, or `None` at the end of the stream.
    pub fn read_message(&mut self) -> QuiverResult<Option<DecoderMessage>> {
        let Some(metadata) = self.read_next()? else {
            return Ok(None);
        };
        let body = self.read_body(&metadata)?;
        self.decoder.decode(&metadata, body).map(Some)
    }

    /// Read a message that must be a schema.
    pub fn read_schema(&mut self) -> QuiverResult<Schema> {
        match self.read_message()? {
            Some(DecoderMessage::Schema(schema)) => Ok(schema),
            Some(other) => quiver_bail!(InvalidSerde: "expected a schema, found {}", other),
            None => quiver_bail!(TruncatedStream: "stream ended before its schema"),
        }
    }

    /// Read a message that must be a record batch, or `None` at the end of the stream.
    pub fn read_record_batch(&mut self) -> QuiverResult<Option<ArrowRecordBatch>> {
        match self.read_message()? {
            Some(DecoderMessage::RecordBatch(batch)) => Ok(Some(batch)),
            Some(other) => quiver_bail!(InvalidSerde: "expected a record batch, found {}", other),
            None => Ok(None),
        }
    }

    /// Total bytes consumed from the input.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.channel.bytes_read()
    }

    #[inline]
    pub fn options(&self) -> &IpcOptions {
        &self.options
    }

    /// The underlying channel, for reading outside any message frame.
    pub fn channel_mut(&mut self) -> &mut ReadChannel<R> {
        &mut self.channel
    }

    pub fn into_inner(self) -> R {
        self.channel.into_inner()
    }

    /// Read one 4-byte prefix word. `None` means the input ended cleanly before it, which is only
    /// acceptable at a message boundary.
    fn read_prefix_word(&mut self, at_boundary: bool) -> QuiverResult<Option<[u8; 4]>> {
        let mut word = [0u8; 4];
        match self.channel.read_fully(&mut word)? {
            4 => Ok(Some(word)),
            0 if at_boundary => Ok(None),
            read => quiver_bail!(
                TruncatedStream: "read {} of 4 bytes of a message prefix",
                read
            ),
        }
    }

    /// Read `length` bytes. Lengths come off the wire, so the buffer only grows as bytes arrive.
    fn read_exact(&mut self, length: usize, what: &str) -> QuiverResult<ByteBuffer> {
        let mut buffer = self.allocator.allocate(length.min(READ_CHUNK_SIZE))?;
        let read = self.channel.read_fully_into(&mut buffer, length)?;
        if read != length {
            quiver_bail!(TruncatedStream: "read {} of {} bytes of {}", read, length, what);
        }
        Ok(buffer.freeze())
    }
}
