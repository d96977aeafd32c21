use hashbrown::{HashMap, HashSet};
use quiver_dtype::{Field, Schema};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_vector::{Vector, VectorSchemaRoot};

use crate::dictionary::{Dictionary, DictionaryProvider, MapDictionaryProvider, to_memory_format};
use crate::loader::load_vectors;
use crate::{ArrowDictionaryBatch, ArrowRecordBatch};

/// The state a reader keeps between messages: the schema in both forms and which dictionaries
/// have arrived.
#[derive(Debug, Clone)]
pub struct ReaderContext {
    schema: Schema,
    wire_schema: Schema,
    dictionaries: MapDictionaryProvider,
    value_fields: HashMap<i64, Field>,
    loaded: HashSet<i64>,
}

impl ReaderContext {
    /// A context for a stream or file whose schema message held `wire_schema`.
    pub fn try_new(wire_schema: Schema) -> QuiverResult<Self> {
        wire_schema.validate()?;
        let (schema, dictionaries) = to_memory_format(&wire_schema)?;
        let value_fields = dictionaries
            .dictionaries()
            .map(|dictionary| (dictionary.id(), dictionary.value_field().clone()))
            .collect();
        Ok(Self {
            schema,
            wire_schema,
            dictionaries,
            value_fields,
            loaded: HashSet::new(),
        })
    }

    /// The schema in memory format.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The schema as read from the wire.
    #[inline]
    pub fn wire_schema(&self) -> &Schema {
        &self.wire_schema
    }

    /// A provider holding an empty dictionary for every id the schema declares.
    pub fn dictionary_provider(&self) -> MapDictionaryProvider {
        self.dictionaries.clone()
    }

    /// Whether a dictionary batch for `id` has been applied.
    pub fn is_loaded(&self, id: i64) -> bool {
        self.loaded.contains(&id)
    }

    /// Apply a dictionary batch to `provider`: a delta appends to the dictionary, anything else
    /// replaces it.
    pub fn load_dictionary(
        &mut self,
        batch: &ArrowDictionaryBatch,
        provider: &mut MapDictionaryProvider,
    ) -> QuiverResult<()> {
        let id = batch.id();
        let (Some(encoding), Some(value_field)) =
            (self.schema.find_dictionary(id), self.value_fields.get(&id))
        else {
            quiver_bail!(
                DictionaryResolution: "dictionary batch for id {} that the schema does not declare",
                id
            );
        };

        let value_schema = Schema::new(vec![value_field.clone()]);
        let Some(values) = load_vectors(&value_schema, batch.data())?.into_iter().next() else {
            quiver_bail!(AssertionFailed: "dictionary {} loaded no vector", id);
        };
        let values = if batch.is_delta() {
            let base = provider
                .lookup(id)
                .filter(|_| self.loaded.contains(&id))
                .ok_or_else(|| {
                    quiver_err!(
                        DictionaryResolution: "delta for dictionary {} before its first batch",
                        id
                    )
                })?;
            base.vector().append(&values)?
        } else {
            values
        };

        log::debug!(
            "applied {} dictionary {}, now {} values",
            if batch.is_delta() { "delta for" } else { "base" },
            id,
            values.len()
        );
        provider.put(Dictionary::new(values, *encoding));
        self.loaded.insert(id);
        Ok(())
    }

    /// Load a record batch into `root`, checking every dictionary index against `provider`.
    /// On error the root is unchanged.
    pub fn load_record_batch(
        &self,
        batch: &ArrowRecordBatch,
        root: &mut VectorSchemaRoot,
        provider: &dyn DictionaryProvider,
    ) -> QuiverResult<()> {
        if root.schema() != &self.schema {
            quiver_bail!(
                SchemaMismatch: "root schema {} differs from the reader schema {}",
                root.schema(),
                self.schema
            );
        }
        let vectors = load_vectors(&self.schema, batch)?;
        for vector in &vectors {
            self.check_indices(vector, provider)?;
        }
        root.replace_vectors(vectors, batch.length())
    }

    fn check_indices(&self, vector: &Vector, provider: &dyn DictionaryProvider) -> QuiverResult<()> {
        if let Some(encoding) = vector.field().dictionary() {
            let id = encoding.id();
            for slot in 0..vector.len() {
                let Some(index) = vector.dictionary_index(slot)? else {
                    continue;
                };
                let size = provider
                    .lookup(id)
                    .filter(|_| self.loaded.contains(&id))
                    .map(|dictionary| dictionary.vector().len())
                    .ok_or_else(|| {
                        quiver_err!(
                            DictionaryResolution: "{} references dictionary {} before it was loaded",
                            vector.field(),
                            id
                        )
                    })?;
                if index >= size {
                    quiver_bail!(
                        DictionaryResolution: "index {} at slot {} of {} is past the {} values of dictionary {}",
                        index,
                        slot,
                        vector.field(),
                        size,
                        id
                    );
                }
            }
        }
        vector
            .children()
            .iter()
            .try_for_each(|child| self.check_indices(child, provider))
    }
}

#[cfg(test)]
mod tests {
    use quiver_dtype::{ArrowType, DictionaryEncoding, IntType};
    use quiver_error::QuiverError;
    use rstest::rstest;

    use super::*;
    use crate::loader::VectorUnloader;

    fn wire_schema() -> Schema {
        Schema::new(vec![
            Field::nullable("v", ArrowType::Utf8)
                .with_dictionary(Some(DictionaryEncoding::new(1, false, Some(IntType::INT8)))),
        ])
    }

    fn dictionary_batch(values: &[&str], is_delta: bool) -> ArrowDictionaryBatch {
        let root =
            VectorSchemaRoot::try_new(vec![Vector::try_from_strs("DICT1", values.iter().map(Some)).unwrap()])
                .unwrap();
        ArrowDictionaryBatch::new(1, VectorUnloader::new(&root).record_batch().unwrap(), is_delta)
    }

    fn index_batch(context: &ReaderContext, indices: &[Option<usize>]) -> ArrowRecordBatch {
        let field = context.schema().fields()[0].clone();
        let root = VectorSchemaRoot::try_new(vec![Vector::try_new_indices(field, indices).unwrap()])
            .unwrap();
        VectorUnloader::new(&root).record_batch().unwrap()
    }

    #[test]
    fn memory_schema_and_empty_dictionaries() {
        let context = ReaderContext::try_new(wire_schema()).unwrap();
        assert_eq!(
            context.schema().fields()[0].data_type(),
            ArrowType::Int(IntType::INT8)
        );
        let provider = context.dictionary_provider();
        assert_eq!(provider.ids(), vec![1]);
        assert!(provider.lookup(1).unwrap().vector().is_empty());
        assert!(!context.is_loaded(1));
    }

    #[test]
    fn base_then_delta() {
        let mut context = ReaderContext::try_new(wire_schema()).unwrap();
        let mut provider = context.dictionary_provider();
        context
            .load_dictionary(&dictionary_batch(&["a", "b"], false), &mut provider)
            .unwrap();
        context
            .load_dictionary(&dictionary_batch(&["c"], true), &mut provider)
            .unwrap();
        let values = provider.lookup(1).unwrap().vector();
        assert_eq!(values.len(), 3);
        assert_eq!(values.str_value(2), Some("c"));
        assert_eq!(values.name(), "DICT1");

        context
            .load_dictionary(&dictionary_batch(&["x"], false), &mut provider)
            .unwrap();
        assert_eq!(provider.lookup(1).unwrap().vector().len(), 1);
    }

    #[test]
    fn delta_before_base() {
        let mut context = ReaderContext::try_new(wire_schema()).unwrap();
        let mut provider = context.dictionary_provider();
        let err = context
            .load_dictionary(&dictionary_batch(&["c"], true), &mut provider)
            .unwrap_err();
        assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
    }

    #[test]
    fn undeclared_dictionary() {
        let mut context = ReaderContext::try_new(wire_schema()).unwrap();
        let mut provider = context.dictionary_provider();
        let batch = dictionary_batch(&["a"], false);
        let undeclared = ArrowDictionaryBatch::new(9, batch.into_data(), false);
        let err = context
            .load_dictionary(&undeclared, &mut provider)
            .unwrap_err();
        assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
    }

    #[rstest]
    #[case::all_null(&[None, None], false, true)]
    #[case::before_dictionary(&[Some(0)], false, false)]
    #[case::in_range(&[Some(1), None], true, true)]
    #[case::past_the_end(&[Some(2)], true, false)]
    fn index_checks(
        #[case] indices: &[Option<usize>],
        #[case] load_dictionary: bool,
        #[case] ok: bool,
    ) {
        let mut context = ReaderContext::try_new(wire_schema()).unwrap();
        let mut provider = context.dictionary_provider();
        if load_dictionary {
            context
                .load_dictionary(&dictionary_batch(&["a", "b"], false), &mut provider)
                .unwrap();
        }
        let mut root = VectorSchemaRoot::create(context.schema().clone());
        let result = context.load_record_batch(&index_batch(&context, indices), &mut root, &provider);
        assert_eq!(result.is_ok(), ok);
        match result {
            Ok(()) => assert_eq!(root.row_count(), indices.len()),
            Err(err) => {
                assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
                assert_eq!(root.row_count(), 0);
            }
        }
    }
}
