use std::io::{Read, Seek};
use std::sync::Arc;

use quiver_buffer::{BufferAllocator, RootAllocator};
use quiver_dtype::{Metadata, Schema};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_flatbuffers::ReadFlatBuffer;
use quiver_ipc::dictionary::MapDictionaryProvider;
use quiver_ipc::messages::{DecoderMessage, MessageDecoder, MessageReader};
use quiver_ipc::{ArrowBlock, ArrowRecordBatch, IpcOptions, ReaderContext};
use quiver_vector::VectorSchemaRoot;

use crate::{ArrowFooter, HEADER_SIZE, MAGIC, MIN_FILE_SIZE};

/// Reads record batches from an IPC file, in order or by index.
#[derive(Debug)]
pub struct FileReader<R> {
    messages: MessageReader<R>,
    footer: ArrowFooter,
    context: ReaderContext,
    footer_start: u64,
    dictionaries_loaded: bool,
    next_batch: usize,
}

impl<R: Read + Seek> FileReader<R> {
    /// Check the magic bytes at both ends of `read` and decode the footer.
    pub fn try_new(read: R, options: IpcOptions) -> QuiverResult<Self> {
        Self::with_allocator(read, options, Arc::new(RootAllocator::new()))
    }

    /// As [`FileReader::try_new`], allocating message bodies from `allocator`.
    pub fn with_allocator(
        read: R,
        options: IpcOptions,
        allocator: Arc<dyn BufferAllocator>,
    ) -> QuiverResult<Self> {
        let mut messages = MessageReader::with_allocator(read, options, allocator);
        let size = messages.channel_mut().size()?;
        if size < MIN_FILE_SIZE {
            quiver_bail!(
                Framing: "file of {} bytes is shorter than the minimum of {}",
                size,
                MIN_FILE_SIZE
            );
        }

        let header = read_at(&mut messages, 0, MAGIC.len())?;
        if header != MAGIC {
            quiver_bail!(Framing: "file does not start with the Arrow magic");
        }
        let trailer = read_at(&mut messages, size - 10, 10)?;
        if trailer[4..] != MAGIC {
            quiver_bail!(Framing: "file does not end with the Arrow magic");
        }
        let footer_length = i32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let footer_start = u64::try_from(footer_length)
            .ok()
            .filter(|&length| length > 0)
            .and_then(|length| (size - 10).checked_sub(length))
            .filter(|&start| start >= HEADER_SIZE as u64)
            .ok_or_else(|| {
                quiver_err!(
                    Framing: "footer length {} does not fit a file of {} bytes",
                    footer_length,
                    size
                )
            })?;

        let length = usize::try_from(size - 10 - footer_start).map_err(|_| {
            quiver_err!(Framing: "footer of {} bytes does not fit memory", footer_length)
        })?;
        let bytes = read_at(&mut messages, footer_start, length)?;
        let footer = ArrowFooter::read_flatbuffer_bytes(&bytes)?;
        let context = ReaderContext::try_new(footer.schema().clone())?;
        log::debug!(
            "opened file of {} bytes with {} dictionary and {} record batches",
            size,
            footer.dictionaries().len(),
            footer.record_batches().len()
        );
        Ok(Self {
            messages,
            footer,
            context,
            footer_start,
            dictionaries_loaded: false,
            next_batch: 0,
        })
    }

    /// The schema in memory format.
    #[inline]
    pub fn schema(&self) -> &Schema {
        self.context.schema()
    }

    /// A provider with an empty dictionary for each id in the schema, for passing to the load
    /// methods.
    pub fn dictionary_provider(&self) -> MapDictionaryProvider {
        self.context.dictionary_provider()
    }

    #[inline]
    pub fn footer(&self) -> &ArrowFooter {
        &self.footer
    }

    /// Custom metadata stored in the footer.
    #[inline]
    pub fn footer_metadata(&self) -> &Metadata {
        self.footer.metadata()
    }

    #[inline]
    pub fn record_blocks(&self) -> &[ArrowBlock] {
        self.footer.record_batches()
    }

    #[inline]
    pub fn dictionary_blocks(&self) -> &[ArrowBlock] {
        self.footer.dictionaries()
    }

    /// Load the next record batch into `root`, applying every dictionary first if that has not
    /// happened yet. Returns `false` once all record batches have been loaded.
    pub fn load_next_batch(
        &mut self,
        root: &mut VectorSchemaRoot,
        provider: &mut MapDictionaryProvider,
    ) -> QuiverResult<bool> {
        if self.next_batch >= self.record_blocks().len() {
            return Ok(false);
        }
        self.load_record_batch(self.next_batch, root, provider)?;
        Ok(true)
    }

    /// Load record batch `index` into `root`. Later calls to
    /// [`FileReader::load_next_batch`] continue after it.
    pub fn load_record_batch(
        &mut self,
        index: usize,
        root: &mut VectorSchemaRoot,
        provider: &mut MapDictionaryProvider,
    ) -> QuiverResult<()> {
        let Some(&block) = self.record_blocks().get(index) else {
            quiver_bail!(OutOfBounds: index, 0, self.record_blocks().len());
        };
        self.ensure_dictionaries(provider)?;
        let batch = self.read_record_batch(&block)?;
        self.context.load_record_batch(&batch, root, provider)?;
        self.next_batch = index + 1;
        Ok(())
    }

    /// Read the record batch at `block` without loading it.
    pub fn read_record_batch(&mut self, block: &ArrowBlock) -> QuiverResult<ArrowRecordBatch> {
        match self.read_block(block)? {
            DecoderMessage::RecordBatch(batch) => Ok(batch),
            other => quiver_bail!(InvalidSerde: "expected a record batch at {}, found {}", block, other),
        }
    }

    pub fn into_inner(self) -> R {
        self.messages.into_inner()
    }

    /// Apply every dictionary block, all or nothing: on error neither `provider` nor the reader
    /// has seen any of them.
    fn ensure_dictionaries(&mut self, provider: &mut MapDictionaryProvider) -> QuiverResult<()> {
        if self.dictionaries_loaded {
            return Ok(());
        }
        let mut context = self.context.clone();
        let mut scratch = provider.clone();
        for block in self.footer.dictionaries().to_vec() {
            match self.read_block(&block)? {
                DecoderMessage::DictionaryBatch(batch) => {
                    context.load_dictionary(&batch, &mut scratch)?;
                }
                other => quiver_bail!(
                    InvalidSerde: "expected a dictionary batch at {}, found {}",
                    block,
                    other
                ),
            }
        }
        self.context = context;
        *provider = scratch;
        self.dictionaries_loaded = true;
        Ok(())
    }

    fn read_block(&mut self, block: &ArrowBlock) -> QuiverResult<DecoderMessage> {
        if block.offset() < HEADER_SIZE as u64 || block.end() > self.footer_start {
            quiver_bail!(
                Framing: "{} lies outside the message region {}..{}",
                block,
                HEADER_SIZE,
                self.footer_start
            );
        }
        self.messages.channel_mut().set_position(block.offset())?;
        let metadata = self
            .messages
            .read_next()?
            .ok_or_else(|| quiver_err!(Framing: "end of stream marker at {}", block))?;
        if metadata.metadata_length() as u64 != u64::from(block.metadata_length())
            || metadata.body_length() != block.body_length()
        {
            quiver_bail!(
                Framing: "message at {} has metadata {} and body {}",
                block,
                metadata.metadata_length(),
                metadata.body_length()
            );
        }
        let body = self.messages.read_body(&metadata)?;
        MessageDecoder.decode(&metadata, body)
    }
}

fn read_at<R: Read + Seek>(
    messages: &mut MessageReader<R>,
    position: u64,
    length: usize,
) -> QuiverResult<Vec<u8>> {
    let channel = messages.channel_mut();
    channel.set_position(position)?;
    let mut bytes = vec![0u8; length];
    let read = channel.read_fully(&mut bytes)?;
    if read != length {
        quiver_bail!(
            TruncatedStream: "read {} of {} bytes at {}",
            read,
            length,
            position
        );
    }
    Ok(bytes)
}
