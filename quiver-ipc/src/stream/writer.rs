use std::io::Write;

use quiver_dtype::Schema;
use quiver_error::QuiverResult;
use quiver_vector::{Vector, VectorSchemaRoot};

use crate::dictionary::DictionaryProvider;
use crate::{ArrowBlock, IpcOptions, IpcWriter, WriterState};

/// Writes record batches as an IPC stream.
///
/// Dictionaries are resent whenever their values change between batches.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: IpcWriter<W>,
}

impl<W: Write> StreamWriter<W> {
    pub fn try_new(
        write: W,
        schema: Schema,
        provider: &dyn DictionaryProvider,
        options: IpcOptions,
    ) -> QuiverResult<Self> {
        Ok(Self {
            inner: IpcWriter::try_new(write, schema, provider, options, true)?,
        })
    }

    /// Write the schema message.
    pub fn start(&mut self) -> QuiverResult<()> {
        self.inner.start()
    }

    /// Write the rows of `root`, preceded by any dictionaries that changed.
    pub fn write_batch(
        &mut self,
        root: &VectorSchemaRoot,
        provider: &dyn DictionaryProvider,
    ) -> QuiverResult<ArrowBlock> {
        self.inner.write_batch(root, provider)
    }

    /// Append `values` to the already written dictionary `id`.
    pub fn write_dictionary_delta(&mut self, id: i64, values: &Vector) -> QuiverResult<ArrowBlock> {
        self.inner.write_dictionary_delta(id, values)
    }

    /// Write the end-of-stream marker and flush.
    pub fn end(&mut self) -> QuiverResult<()> {
        self.inner.end()
    }

    /// Start and end the stream as needed and return the sink.
    pub fn finish(mut self) -> QuiverResult<W> {
        self.inner.finish()?;
        Ok(self.inner.into_inner())
    }

    #[inline]
    pub fn state(&self) -> WriterState {
        self.inner.state()
    }

    /// Bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        self.inner.schema()
    }
}
