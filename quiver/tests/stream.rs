#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use quiver::buffer::ByteBuffer;
    use quiver::dictionary::{
        Dictionary, DictionaryEncoder, DictionaryProvider, MapDictionaryProvider,
        to_message_format,
    };
    use quiver::dtype::{ArrowType, DateUnit, DictionaryEncoding, Field, IntType, Schema};
    use quiver::error::QuiverError;
    use quiver::loader::{VectorLoader, VectorUnloader};
    use quiver::messages::{
        DecoderMessage, EncodedMessage, EncoderMessage, MessageEncoder, MessageReader, MessageWriter,
    };
    use quiver::stream::{StreamReader, StreamWriter};
    use quiver::{
        ArrowDictionaryBatch, ArrowFieldNode, ArrowRecordBatch, IpcOptions, Vector,
        VectorSchemaRoot,
    };
    use rstest::rstest;

    fn encoding(id: i64) -> DictionaryEncoding {
        DictionaryEncoding::new(id, false, Some(IntType::INT16))
    }

    fn strings(id: i64, values: &[&str]) -> Dictionary {
        Dictionary::new(
            Vector::try_from_strs(format!("DICT{id}"), values.iter().map(Some)).unwrap(),
            encoding(id),
        )
    }

    fn coded_field(name: &str, id: i64) -> Field {
        Field::nullable(name, ArrowType::Int(IntType::INT16)).with_dictionary(Some(encoding(id)))
    }

    fn read_all(bytes: &[u8], options: IpcOptions) -> (Schema, Vec<VectorSchemaRoot>) {
        let mut reader = StreamReader::try_new(Cursor::new(bytes), options).unwrap();
        let mut provider = reader.dictionary_provider();
        let mut root = VectorSchemaRoot::create(reader.schema().clone());
        let mut roots = Vec::new();
        while reader.load_next_batch(&mut root, &mut provider).unwrap() {
            roots.push(root.clone());
        }
        assert_eq!(reader.bytes_read(), bytes.len() as u64);
        (reader.schema().clone(), roots)
    }

    #[test]
    fn empty_stream() {
        let schema = Schema::new(vec![coded_field("s", 1)]);
        let provider: MapDictionaryProvider = [strings(1, &["a"])].into_iter().collect();
        let bytes = StreamWriter::try_new(Vec::new(), schema.clone(), &provider, IpcOptions::default())
            .unwrap()
            .finish()
            .unwrap();

        let mut reader = StreamReader::try_new(Cursor::new(&bytes), IpcOptions::default()).unwrap();
        assert_eq!(reader.schema(), &schema);
        let mut dictionaries = reader.dictionary_provider();
        assert_eq!(dictionaries.len(), 1);
        assert!(dictionaries.lookup(1).unwrap().vector().is_empty());
        let mut root = VectorSchemaRoot::create(schema);
        assert!(!reader.load_next_batch(&mut root, &mut dictionaries).unwrap());
        assert_eq!(&bytes[bytes.len() - 8..], &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
    }

    #[rstest]
    #[case::current(IpcOptions::default())]
    #[case::legacy(IpcOptions::legacy())]
    fn int8_with_half_nulls(#[case] options: IpcOptions) {
        let schema = Schema::new(vec![Field::nullable("testField", ArrowType::Int(IntType::INT8))]);
        let batch = ArrowRecordBatch::new(
            16,
            vec![ArrowFieldNode::try_new(16, 8).unwrap()],
            vec![
                ByteBuffer::copy_from([0xff, 0x00]),
                ByteBuffer::copy_from((1..=16).collect::<Vec<u8>>()),
            ],
        );
        let mut root = VectorSchemaRoot::create(schema.clone());
        VectorLoader::new(&mut root).load(&batch).unwrap();

        let provider = MapDictionaryProvider::new();
        let mut writer = StreamWriter::try_new(Vec::new(), schema, &provider, options).unwrap();
        writer.start().unwrap();
        writer.write_batch(&root, &provider).unwrap();
        let bytes = writer.finish().unwrap();

        let (_, roots) = read_all(&bytes, options);
        assert_eq!(roots.len(), 1);
        let vector = &roots[0].vectors()[0];
        assert_eq!(vector.len(), 16);
        assert_eq!(vector.null_count(), 8);
        for i in 0..8 {
            assert_eq!(vector.value::<i8>(i), i8::try_from(i + 1).ok());
            assert!(vector.is_null(i + 8));
        }
        let unloaded = VectorUnloader::new(&roots[0]).record_batch().unwrap();
        assert_eq!(unloaded.buffers().len(), 2);
        assert_eq!(unloaded.nodes(), batch.nodes());
        assert_eq!(unloaded, batch);
    }

    fn mixed_root() -> VectorSchemaRoot {
        let items = Vector::try_from_strs("item", [Some("a"), None, Some("bcd"), Some("")]).unwrap();
        let list = Vector::try_new_list("l", &[0, 2, 2, 4], &[true, false, true], items).unwrap();
        let flags = Vector::bools("flags", [Some(true), None, Some(false)]);
        let nested = Vector::try_new_struct("st", vec![flags, Vector::nulls("nothing", 3)]).unwrap();
        let days = Vector::try_new(
            Field::nullable("day", ArrowType::Date(DateUnit::Day)),
            3,
            1,
            vec![
                ByteBuffer::copy_from([0b101]),
                ByteBuffer::copy_from([1, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0]),
            ],
            vec![],
        )
        .unwrap();
        let floats = Vector::primitive("f", [Some(1.5f64), Some(-0.25), None]);
        VectorSchemaRoot::try_new(vec![list, nested, days, floats]).unwrap()
    }

    #[rstest]
    #[case::current(IpcOptions::default())]
    #[case::legacy(IpcOptions::legacy())]
    fn round_trip_nested_types(#[case] options: IpcOptions) {
        let root = mixed_root();
        let provider = MapDictionaryProvider::new();
        let mut writer =
            StreamWriter::try_new(Vec::new(), root.schema().clone(), &provider, options).unwrap();
        writer.start().unwrap();
        writer.write_batch(&root, &provider).unwrap();
        writer.write_batch(&root, &provider).unwrap();
        let bytes = writer.finish().unwrap();

        let (schema, roots) = read_all(&bytes, options);
        assert_eq!(&schema, root.schema());
        assert_eq!(roots, vec![root.clone(), root]);
    }

    #[rstest]
    #[case::current_read_as_legacy(IpcOptions::default(), IpcOptions::legacy())]
    #[case::legacy_read_as_current(IpcOptions::legacy(), IpcOptions::default())]
    fn framing_mode_is_not_guessed(#[case] written: IpcOptions, #[case] read: IpcOptions) {
        let root = mixed_root();
        let provider = MapDictionaryProvider::new();
        let bytes = StreamWriter::try_new(Vec::new(), root.schema().clone(), &provider, written)
            .unwrap()
            .finish()
            .unwrap();
        let err = StreamReader::try_new(Cursor::new(bytes), read).unwrap_err();
        assert!(matches!(err, QuiverError::Framing(..)), "{err}");
    }

    #[test]
    fn dictionaries_precede_the_batches_that_use_them() {
        let schema = Schema::new(vec![coded_field("s", 1)]);
        let dictionary = strings(1, &["x", "y"]);
        let provider: MapDictionaryProvider = [dictionary.clone()].into_iter().collect();
        let values = Vector::try_from_strs("s", [Some("y"), None, Some("x")]).unwrap();
        let root = VectorSchemaRoot::try_new(vec![
            DictionaryEncoder::new(&dictionary).encode(&values).unwrap(),
        ])
        .unwrap();

        let mut writer =
            StreamWriter::try_new(Vec::new(), schema, &provider, IpcOptions::default()).unwrap();
        writer.start().unwrap();
        writer.write_batch(&root, &provider).unwrap();
        writer.write_batch(&root, &provider).unwrap();
        let bytes = writer.finish().unwrap();

        let mut messages = MessageReader::new(Cursor::new(bytes), IpcOptions::default());
        let kinds = std::iter::from_fn(|| messages.read_message().unwrap())
            .map(|message| match message {
                DecoderMessage::Schema(_) => "schema".to_string(),
                DecoderMessage::DictionaryBatch(batch) => format!("dictionary {}", batch.id()),
                DecoderMessage::RecordBatch(_) => "batch".to_string(),
            })
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec!["schema", "dictionary 1", "batch", "batch"]);
    }

    /// Hand-framed stream: dictionary 1, a batch using only it, dictionary 2, a batch using both.
    fn interleaved(second_dictionary: bool) -> Vec<u8> {
        let options = IpcOptions::default();
        let memory = Schema::new(vec![coded_field("a", 1), coded_field("b", 2)]);
        let dict1 = strings(1, &["foo", "bar"]);
        let dict2 = strings(2, &["aa", "bb", "cc"]);
        let provider: MapDictionaryProvider = [dict1.clone(), dict2.clone()].into_iter().collect();
        let (wire, ids) = to_message_format(&memory, &provider).unwrap();
        assert_eq!(ids, vec![1, 2]);

        let encoder = MessageEncoder::new(&options);
        let mut writer = MessageWriter::new(Vec::new(), options);
        let mut write = |encoded: EncodedMessage| {
            writer.write_message(&encoded).unwrap();
        };
        let dictionary_batch = |dictionary: &Dictionary| {
            let root = VectorSchemaRoot::try_new(vec![dictionary.vector().clone()]).unwrap();
            ArrowDictionaryBatch::new(
                dictionary.id(),
                VectorUnloader::new(&root).record_batch().unwrap(),
                false,
            )
        };
        let record_batch = |a: &[Option<usize>], b: &[Option<usize>]| {
            let root = VectorSchemaRoot::try_new(vec![
                Vector::try_new_indices(memory.fields()[0].clone(), a).unwrap(),
                Vector::try_new_indices(memory.fields()[1].clone(), b).unwrap(),
            ])
            .unwrap();
            VectorUnloader::new(&root).record_batch().unwrap()
        };

        write(encoder.encode(EncoderMessage::Schema(&wire)).unwrap());
        write(encoder.encode(EncoderMessage::DictionaryBatch(&dictionary_batch(&dict1))).unwrap());
        let first = record_batch(&[Some(0), Some(1)], &[None, None]);
        write(encoder.encode(EncoderMessage::RecordBatch(&first)).unwrap());
        if second_dictionary {
            write(encoder.encode(EncoderMessage::DictionaryBatch(&dictionary_batch(&dict2))).unwrap());
        }
        let second = record_batch(&[Some(1)], &[Some(2)]);
        write(encoder.encode(EncoderMessage::RecordBatch(&second)).unwrap());
        writer.write_eos().unwrap();
        writer.into_inner()
    }

    #[test]
    fn interleaved_dictionaries() {
        let bytes = interleaved(true);
        let mut reader = StreamReader::try_new(Cursor::new(bytes), IpcOptions::default()).unwrap();
        let mut provider = reader.dictionary_provider();
        let mut root = VectorSchemaRoot::create(reader.schema().clone());

        assert!(reader.load_next_batch(&mut root, &mut provider).unwrap());
        assert_eq!(root.row_count(), 2);
        let a = DictionaryEncoder::new(provider.lookup(1).unwrap())
            .decode(&root.vectors()[0])
            .unwrap();
        assert_eq!(a.str_value(1), Some("bar"));
        assert!(reader.is_loaded(1));
        assert!(!reader.is_loaded(2));
        assert!(provider.lookup(2).unwrap().vector().is_empty());

        assert!(reader.load_next_batch(&mut root, &mut provider).unwrap());
        let b = DictionaryEncoder::new(provider.lookup(2).unwrap())
            .decode(&root.vectors()[1])
            .unwrap();
        assert_eq!(b.str_value(0), Some("cc"));
        assert!(reader.is_loaded(1) && reader.is_loaded(2));
        let resolvable = [1, 2]
            .into_iter()
            .filter(|&id| provider.lookup(id).is_some_and(|d| !d.vector().is_empty()))
            .count();
        assert_eq!(resolvable, 2);
        assert!(!reader.load_next_batch(&mut root, &mut provider).unwrap());
    }

    #[test]
    fn index_before_its_dictionary() {
        let bytes = interleaved(false);
        let mut reader = StreamReader::try_new(Cursor::new(bytes), IpcOptions::default()).unwrap();
        let mut provider = reader.dictionary_provider();
        let mut root = VectorSchemaRoot::create(reader.schema().clone());
        assert!(reader.load_next_batch(&mut root, &mut provider).unwrap());
        let err = reader
            .load_next_batch(&mut root, &mut provider)
            .unwrap_err();
        assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
        assert_eq!(root.row_count(), 2, "a failed load leaves the previous batch");
    }

    #[test]
    fn buffer_count_mismatch() {
        let options = IpcOptions::default();
        let schema = Schema::new(vec![Field::nullable("s", ArrowType::Utf8)]);
        let encoder = MessageEncoder::new(&options);
        let mut writer = MessageWriter::new(Vec::new(), options);
        let short = ArrowRecordBatch::new(
            1,
            vec![ArrowFieldNode::try_new(1, 0).unwrap()],
            vec![ByteBuffer::empty(), ByteBuffer::copy_from([0u8, 0, 0, 0, 1, 0, 0, 0])],
        );
        writer
            .write_message(&encoder.encode(EncoderMessage::Schema(&schema)).unwrap())
            .unwrap();
        writer
            .write_message(&encoder.encode(EncoderMessage::RecordBatch(&short)).unwrap())
            .unwrap();
        writer.write_eos().unwrap();

        let mut reader = StreamReader::try_new(Cursor::new(writer.into_inner()), options).unwrap();
        let mut provider = reader.dictionary_provider();
        let mut root = VectorSchemaRoot::create(schema);
        let err = reader
            .load_next_batch(&mut root, &mut provider)
            .unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn schema_metadata_survives() {
        let root = mixed_root();
        let schema = root
            .schema()
            .clone()
            .with_metadata([("k".to_string(), "v".to_string())].into());
        let root = VectorSchemaRoot::try_with_schema(schema.clone(), root.vectors().to_vec()).unwrap();
        let provider = MapDictionaryProvider::new();
        let mut writer =
            StreamWriter::try_new(Vec::new(), schema.clone(), &provider, IpcOptions::default())
                .unwrap();
        writer.start().unwrap();
        writer.write_batch(&root, &provider).unwrap();
        let (read, roots) = read_all(&writer.finish().unwrap(), IpcOptions::default());
        assert_eq!(read, schema);
        assert_eq!(read.metadata().get("k").map(String::as_str), Some("v"));
        assert_eq!(roots, vec![root]);
    }
}
