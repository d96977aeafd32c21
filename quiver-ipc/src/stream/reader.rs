use std::io::Read;
use std::sync::Arc;

use quiver_buffer::BufferAllocator;
use quiver_dtype::Schema;
use quiver_error::{QuiverResult, quiver_bail};
use quiver_vector::VectorSchemaRoot;

use crate::dictionary::MapDictionaryProvider;
use crate::messages::{DecoderMessage, MessageReader};
use crate::{IpcOptions, ReaderContext};

/// Reads record batches from an IPC stream.
#[derive(Debug)]
pub struct StreamReader<R> {
    messages: MessageReader<R>,
    context: ReaderContext,
    finished: bool,
}

impl<R: Read> StreamReader<R> {
    /// Read the schema message at the start of `read`.
    pub fn try_new(read: R, options: IpcOptions) -> QuiverResult<Self> {
        Self::from_messages(MessageReader::new(read, options))
    }

    /// As [`StreamReader::try_new`], allocating message bodies from `allocator`.
    pub fn with_allocator(
        read: R,
        options: IpcOptions,
        allocator: Arc<dyn BufferAllocator>,
    ) -> QuiverResult<Self> {
        Self::from_messages(MessageReader::with_allocator(read, options, allocator))
    }

    fn from_messages(mut messages: MessageReader<R>) -> QuiverResult<Self> {
        let context = ReaderContext::try_new(messages.read_schema()?)?;
        Ok(Self {
            messages,
            context,
            finished: false,
        })
    }

    /// The schema in memory format.
    #[inline]
    pub fn schema(&self) -> &Schema {
        self.context.schema()
    }

    /// Whether a dictionary batch for `id` has arrived on this stream.
    pub fn is_loaded(&self, id: i64) -> bool {
        self.context.is_loaded(id)
    }

    /// A provider with an empty dictionary for each id in the schema, for passing to
    /// [`StreamReader::load_next_batch`].
    pub fn dictionary_provider(&self) -> MapDictionaryProvider {
        self.context.dictionary_provider()
    }

    /// Apply dictionary batches until the next record batch, which is loaded into `root`.
    ///
    /// Returns `false` at the end of the stream, and on every call after that.
    pub fn load_next_batch(
        &mut self,
        root: &mut VectorSchemaRoot,
        provider: &mut MapDictionaryProvider,
    ) -> QuiverResult<bool> {
        if self.finished {
            return Ok(false);
        }
        loop {
            match self.messages.read_message()? {
                None => {
                    self.finished = true;
                    return Ok(false);
                }
                Some(DecoderMessage::DictionaryBatch(batch)) => {
                    self.context.load_dictionary(&batch, provider)?;
                }
                Some(DecoderMessage::RecordBatch(batch)) => {
                    self.context.load_record_batch(&batch, root, provider)?;
                    return Ok(true);
                }
                Some(DecoderMessage::Schema(_)) => {
                    quiver_bail!(InvalidSerde: "unexpected second schema message in stream");
                }
            }
        }
    }

    /// Total bytes consumed from the input.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.messages.bytes_read()
    }

    pub fn into_inner(self) -> R {
        self.messages.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use quiver_dtype::{ArrowType, DictionaryEncoding, Field, IntType};
    use quiver_error::QuiverError;
    use quiver_vector::Vector;
    use rstest::rstest;

    use super::*;
    use crate::dictionary::{Dictionary, DictionaryEncoder, DictionaryProvider};
    use crate::stream::StreamWriter;

    fn encoding() -> DictionaryEncoding {
        DictionaryEncoding::new(7, false, None)
    }

    fn dictionary(values: &[&str]) -> Dictionary {
        Dictionary::new(
            Vector::try_from_strs("DICT7", values.iter().map(Some)).unwrap(),
            encoding(),
        )
    }

    fn schema() -> Schema {
        Schema::new(vec![
            Field::nullable("n", ArrowType::Int(IntType::INT64)),
            Field::nullable("s", ArrowType::Int(IntType::INT32)).with_dictionary(Some(encoding())),
        ])
    }

    fn root(n: &[Option<i64>], s: &[Option<&str>], dictionary: &Dictionary) -> VectorSchemaRoot {
        let strings = Vector::try_from_strs("s", s.iter().copied()).unwrap();
        let indices = DictionaryEncoder::new(dictionary).encode(&strings).unwrap();
        VectorSchemaRoot::try_new(vec![Vector::primitive("n", n.iter().copied()), indices]).unwrap()
    }

    #[rstest]
    #[case::current(IpcOptions::default())]
    #[case::legacy(IpcOptions::legacy())]
    fn dictionaries_follow_batches(#[case] options: IpcOptions) {
        let first = dictionary(&["x", "y"]);
        let second = dictionary(&["y", "z", "w"]);
        let mut provider = MapDictionaryProvider::new();
        provider.put(first.clone());

        let mut writer = StreamWriter::try_new(Vec::new(), schema(), &provider, options).unwrap();
        writer.start().unwrap();
        writer
            .write_batch(&root(&[Some(1), None], &[Some("y"), Some("x")], &first), &provider)
            .unwrap();
        provider.put(second.clone());
        writer
            .write_batch(&root(&[Some(3)], &[Some("w")], &second), &provider)
            .unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = StreamReader::try_new(Cursor::new(&bytes), options).unwrap();
        assert_eq!(reader.schema(), &schema());
        let mut dictionaries = reader.dictionary_provider();
        let mut loaded = VectorSchemaRoot::create(reader.schema().clone());

        assert!(reader.load_next_batch(&mut loaded, &mut dictionaries).unwrap());
        assert_eq!(loaded.row_count(), 2);
        let decoded = DictionaryEncoder::new(dictionaries.lookup(7).unwrap())
            .decode(&loaded.vectors()[1])
            .unwrap();
        assert_eq!(decoded.str_value(0), Some("y"));
        assert_eq!(decoded.str_value(1), Some("x"));

        assert!(reader.load_next_batch(&mut loaded, &mut dictionaries).unwrap());
        assert_eq!(loaded.vectors()[0].value::<i64>(0), Some(3));
        assert_eq!(dictionaries.lookup(7).unwrap().vector(), second.vector());

        assert!(!reader.load_next_batch(&mut loaded, &mut dictionaries).unwrap());
        assert!(!reader.load_next_batch(&mut loaded, &mut dictionaries).unwrap());
        assert_eq!(reader.bytes_read(), bytes.len() as u64);
    }

    #[test]
    fn deltas_extend_the_dictionary() {
        let base = dictionary(&["a"]);
        let provider: MapDictionaryProvider = [base.clone()].into_iter().collect();
        let mut writer =
            StreamWriter::try_new(Vec::new(), schema(), &provider, IpcOptions::default()).unwrap();
        writer.start().unwrap();
        writer
            .write_batch(&root(&[Some(1)], &[Some("a")], &base), &provider)
            .unwrap();
        writer
            .write_dictionary_delta(7, &Vector::try_from_strs("DICT7", [Some("b")]).unwrap())
            .unwrap();
        let extended = dictionary(&["a", "b"]);
        let field = schema().fields()[1].clone();
        let indices = Vector::try_new_indices(field, &[Some(1)]).unwrap();
        let batch = VectorSchemaRoot::try_new(vec![Vector::primitive("n", [Some(2i64)]), indices])
            .unwrap();
        writer.write_batch(&batch, &[extended].into_iter().collect::<MapDictionaryProvider>()).unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = StreamReader::try_new(Cursor::new(bytes), IpcOptions::default()).unwrap();
        let mut dictionaries = reader.dictionary_provider();
        let mut loaded = VectorSchemaRoot::create(reader.schema().clone());
        assert!(reader.load_next_batch(&mut loaded, &mut dictionaries).unwrap());
        assert!(reader.load_next_batch(&mut loaded, &mut dictionaries).unwrap());
        assert_eq!(dictionaries.lookup(7).unwrap().vector().len(), 2);
        assert_eq!(loaded.vectors()[1].dictionary_index(0).unwrap(), Some(1));
    }

    #[test]
    fn missing_schema_is_truncated() {
        let err = StreamReader::try_new(Cursor::new(Vec::new()), IpcOptions::default()).unwrap_err();
        assert!(matches!(err, QuiverError::TruncatedStream(..)), "{err}");
    }
}
