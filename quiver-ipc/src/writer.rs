use std::fmt::{Display, Formatter};
use std::io::Write;

use hashbrown::HashMap;
use itertools::Itertools;
use quiver_dtype::{Field, Schema};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_vector::{Vector, VectorSchemaRoot};

use crate::dictionary::{DictionaryProvider, to_message_format};
use crate::loader::VectorUnloader;
use crate::messages::{EncoderMessage, MessageEncoder, MessageWriter};
use crate::{ArrowBlock, ArrowDictionaryBatch, IpcOptions};

/// Where a writer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    NotStarted,
    Started,
    Ended,
}

impl Display for WriterState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterState::NotStarted => write!(f, "not started"),
            WriterState::Started => write!(f, "started"),
            WriterState::Ended => write!(f, "ended"),
        }
    }
}

/// The message sequence shared by the stream and file writers: a schema, then dictionary and
/// record batches, then the end-of-stream marker.
#[derive(Debug)]
pub struct IpcWriter<W> {
    messages: MessageWriter<W>,
    encoder: MessageEncoder,
    schema: Schema,
    wire_schema: Schema,
    dictionary_ids: Vec<i64>,
    value_fields: HashMap<i64, Field>,
    written: HashMap<i64, Vector>,
    state: WriterState,
    dictionary_blocks: Vec<ArrowBlock>,
    record_blocks: Vec<ArrowBlock>,
    replace_dictionaries: bool,
}

impl<W: Write> IpcWriter<W> {
    /// A writer for batches of `schema`, which is in memory format. Every dictionary the schema
    /// references must resolve through `provider`.
    ///
    /// With `replace_dictionaries` unset a dictionary is written at most once, as the file
    /// format requires.
    pub fn try_new(
        write: W,
        schema: Schema,
        provider: &dyn DictionaryProvider,
        options: IpcOptions,
        replace_dictionaries: bool,
    ) -> QuiverResult<Self> {
        schema.validate()?;
        let (wire_schema, dictionary_ids) = to_message_format(&schema, provider)?;
        let value_fields = dictionary_ids
            .iter()
            .filter_map(|&id| {
                provider
                    .lookup(id)
                    .map(|dictionary| (id, dictionary.value_field().clone()))
            })
            .collect();
        Ok(Self {
            messages: MessageWriter::new(write, options),
            encoder: MessageEncoder::new(&options),
            schema,
            wire_schema,
            dictionary_ids,
            value_fields,
            written: HashMap::new(),
            state: WriterState::NotStarted,
            dictionary_blocks: Vec::new(),
            record_blocks: Vec::new(),
            replace_dictionaries,
        })
    }

    /// Write the schema message.
    pub fn start(&mut self) -> QuiverResult<()> {
        if self.state != WriterState::NotStarted {
            quiver_bail!(Sequence: "cannot start a writer that is {}", self.state);
        }
        let encoded = self
            .encoder
            .encode(EncoderMessage::Schema(&self.wire_schema))?;
        self.messages.write_message(&encoded)?;
        self.state = WriterState::Started;
        log::debug!(
            "started writer with {} fields and dictionaries [{}]",
            self.wire_schema.len(),
            self.dictionary_ids.iter().join(", ")
        );
        Ok(())
    }

    /// Write the rows of `root`, preceded by every dictionary whose values changed since they
    /// were last written.
    pub fn write_batch(
        &mut self,
        root: &VectorSchemaRoot,
        provider: &dyn DictionaryProvider,
    ) -> QuiverResult<ArrowBlock> {
        self.ensure_started()?;
        if root.schema() != &self.schema {
            quiver_bail!(
                SchemaMismatch: "batch schema {} differs from the writer schema {}",
                root.schema(),
                self.schema
            );
        }

        for id in self.dictionary_ids.clone() {
            let dictionary = provider.lookup(id).ok_or_else(|| {
                quiver_err!(DictionaryResolution: "provider has no dictionary {}", id)
            })?;
            let values = dictionary.vector();
            match self.written.get(&id) {
                Some(written) if written == values => continue,
                Some(_) if !self.replace_dictionaries => quiver_bail!(
                    DictionaryResolution: "dictionary {} was already written and cannot be replaced",
                    id
                ),
                _ => {}
            }
            self.write_dictionary(id, values, false)?;
            self.written.insert(id, values.clone());
        }

        let batch = VectorUnloader::new(root).record_batch()?;
        let encoded = self.encoder.encode(EncoderMessage::RecordBatch(&batch))?;
        let block = self.messages.write_message(&encoded)?;
        self.record_blocks.push(block);
        Ok(block)
    }

    /// Append `values` to dictionary `id`, which must already have been written.
    pub fn write_dictionary_delta(&mut self, id: i64, values: &Vector) -> QuiverResult<ArrowBlock> {
        self.ensure_started()?;
        if !self.replace_dictionaries {
            quiver_bail!("dictionary deltas are not supported by this writer");
        }
        let Some(base) = self.written.get(&id) else {
            quiver_bail!(
                DictionaryResolution: "delta for dictionary {} before its first batch",
                id
            );
        };
        let appended = base.append(values)?;
        let block = self.write_dictionary(id, values, true)?;
        self.written.insert(id, appended);
        Ok(block)
    }

    /// Write the end-of-stream marker and flush.
    pub fn end(&mut self) -> QuiverResult<()> {
        self.ensure_started()?;
        self.messages.write_eos()?;
        self.messages.flush()?;
        self.state = WriterState::Ended;
        log::debug!(
            "ended writer after {} dictionary and {} record batches",
            self.dictionary_blocks.len(),
            self.record_blocks.len()
        );
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.messages.position()
    }

    /// The schema in memory format.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The schema as written to the wire.
    #[inline]
    pub fn wire_schema(&self) -> &Schema {
        &self.wire_schema
    }

    #[inline]
    pub fn dictionary_blocks(&self) -> &[ArrowBlock] {
        &self.dictionary_blocks
    }

    #[inline]
    pub fn record_blocks(&self) -> &[ArrowBlock] {
        &self.record_blocks
    }

    /// The message writer, for bytes that frame the message sequence.
    pub fn messages_mut(&mut self) -> &mut MessageWriter<W> {
        &mut self.messages
    }

    /// Unwrap the sink. Call [`IpcWriter::end`] first.
    pub fn into_inner(self) -> W {
        self.messages.into_inner()
    }

    /// Start the writer if it has not started, then end it.
    pub fn finish(&mut self) -> QuiverResult<()> {
        match self.state {
            WriterState::NotStarted => {
                self.start()?;
                self.end()
            }
            WriterState::Started => self.end(),
            WriterState::Ended => Ok(()),
        }
    }

    fn ensure_started(&self) -> QuiverResult<()> {
        match self.state {
            WriterState::Started => Ok(()),
            other => quiver_bail!(Sequence: "the writer is {}, not started", other),
        }
    }

    fn write_dictionary(
        &mut self,
        id: i64,
        values: &Vector,
        is_delta: bool,
    ) -> QuiverResult<ArrowBlock> {
        let expected = self.value_fields.get(&id).ok_or_else(|| {
            quiver_err!(DictionaryResolution: "dictionary {} is not in the schema", id)
        })?;
        if values.field().data_type() != expected.data_type() {
            quiver_bail!(
                SchemaMismatch: "dictionary {} holds {} values, the schema declares {}",
                id,
                values.field().data_type(),
                expected.data_type()
            );
        }

        let root = VectorSchemaRoot::try_new(vec![values.clone()])?;
        let data = VectorUnloader::new(&root).record_batch()?;
        let batch = ArrowDictionaryBatch::new(id, data, is_delta);
        let encoded = self
            .encoder
            .encode(EncoderMessage::DictionaryBatch(&batch))?;
        let block = self.messages.write_message(&encoded)?;
        self.dictionary_blocks.push(block);
        log::debug!(
            "wrote {} dictionary {} with {} values",
            if is_delta { "delta for" } else { "base" },
            id,
            values.len()
        );
        Ok(block)
    }
}
