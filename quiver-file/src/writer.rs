use std::io::Write;

use quiver_dtype::{Metadata, Schema};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_ipc::dictionary::DictionaryProvider;
use quiver_ipc::{ArrowBlock, IpcOptions, IpcWriter, WriterState};
use quiver_vector::VectorSchemaRoot;

use crate::{ArrowFooter, HEADER_SIZE, MAGIC};

/// Writes record batches as an IPC file.
///
/// Each dictionary is written once, before the first record batch that needs it; replacing a
/// written dictionary is an error.
#[derive(Debug)]
pub struct FileWriter<W> {
    inner: IpcWriter<W>,
    options: IpcOptions,
    metadata: Metadata,
}

impl<W: Write> FileWriter<W> {
    pub fn try_new(
        write: W,
        schema: Schema,
        provider: &dyn DictionaryProvider,
        options: IpcOptions,
    ) -> QuiverResult<Self> {
        Ok(Self {
            inner: IpcWriter::try_new(write, schema, provider, options, false)?,
            options,
            metadata: Metadata::new(),
        })
    }

    /// Custom metadata to store in the footer.
    pub fn with_footer_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Write the leading magic and the schema message.
    pub fn start(&mut self) -> QuiverResult<()> {
        if self.inner.state() != WriterState::NotStarted {
            quiver_bail!(Sequence: "cannot start a file writer that is {}", self.inner.state());
        }
        let channel = self.inner.messages_mut().channel_mut();
        channel.write_all(&MAGIC)?;
        channel.write_zeros(HEADER_SIZE - MAGIC.len())?;
        self.inner.start()
    }

    /// Write the rows of `root`, preceded by any dictionaries not yet written.
    pub fn write_batch(
        &mut self,
        root: &VectorSchemaRoot,
        provider: &dyn DictionaryProvider,
    ) -> QuiverResult<ArrowBlock> {
        self.ensure_started()?;
        self.inner.write_batch(root, provider)
    }

    /// Write the end-of-stream marker, the footer and the trailing magic.
    pub fn end(&mut self) -> QuiverResult<()> {
        self.ensure_started()?;
        self.inner.end()?;

        let footer = ArrowFooter::new(
            self.inner.wire_schema().clone(),
            self.inner.dictionary_blocks().to_vec(),
            self.inner.record_blocks().to_vec(),
            self.metadata.clone(),
        );
        let bytes = footer.encode(self.options.metadata_version)?;
        let length = i32::try_from(bytes.len())
            .map_err(|_| quiver_err!(Framing: "footer of {} bytes overflows", bytes.len()))?;

        let messages = self.inner.messages_mut();
        let channel = messages.channel_mut();
        channel.write_all(&bytes)?;
        channel.write_i32_le(length)?;
        channel.write_all(&MAGIC)?;
        messages.flush()?;
        log::debug!(
            "wrote footer of {} bytes indexing {} dictionary and {} record batches",
            bytes.len(),
            footer.dictionaries().len(),
            footer.record_batches().len()
        );
        Ok(())
    }

    /// Start and end the file as needed and return the sink.
    pub fn finish(mut self) -> QuiverResult<W> {
        match self.inner.state() {
            WriterState::NotStarted => {
                self.start()?;
                self.end()?;
            }
            WriterState::Started => self.end()?,
            WriterState::Ended => {}
        }
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

    #[inline]
    pub fn dictionary_blocks(&self) -> &[ArrowBlock] {
        self.inner.dictionary_blocks()
    }

    #[inline]
    pub fn record_blocks(&self) -> &[ArrowBlock] {
        self.inner.record_blocks()
    }

    fn ensure_started(&self) -> QuiverResult<()> {
        match self.inner.state() {
            WriterState::Started => Ok(()),
            other => quiver_bail!(Sequence: "the file writer is {}, not started", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use quiver_dtype::{ArrowType, Field, IntType};
    use quiver_error::QuiverError;
    use quiver_ipc::dictionary::MapDictionaryProvider;

    use super::*;

    fn writer() -> FileWriter<Vec<u8>> {
        let schema = Schema::new(vec![Field::nullable("x", ArrowType::Int(IntType::INT16))]);
        FileWriter::try_new(
            Vec::new(),
            schema,
            &MapDictionaryProvider::new(),
            IpcOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn empty_file_layout() {
        let bytes = writer().finish().unwrap();
        assert_eq!(&bytes[..8], b"ARROW1\0\0");
        assert_eq!(&bytes[bytes.len() - 6..], b"ARROW1");
        let length_at = bytes.len() - 10;
        let length = i32::from_le_bytes(bytes[length_at..length_at + 4].try_into().unwrap());
        let footer_start = length_at - length as usize;
        assert_eq!(
            &bytes[footer_start - 8..footer_start],
            &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]
        );
    }

    #[test]
    fn calls_out_of_order() {
        let mut writer = writer();
        let root = VectorSchemaRoot::create(writer.schema().clone());
        let err = writer
            .write_batch(&root, &MapDictionaryProvider::new())
            .unwrap_err();
        assert!(matches!(err, QuiverError::Sequence(..)), "{err}");
        assert!(matches!(writer.end().unwrap_err(), QuiverError::Sequence(..)));
        assert_eq!(writer.position(), 0);

        writer.start().unwrap();
        assert_eq!(writer.position() % 8, 0);
        assert!(matches!(writer.start().unwrap_err(), QuiverError::Sequence(..)));
        writer.end().unwrap();
        let err = writer
            .write_batch(&root, &MapDictionaryProvider::new())
            .unwrap_err();
        assert!(matches!(err, QuiverError::Sequence(..)), "{err}");
    }
}
