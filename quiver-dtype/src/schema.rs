use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use quiver_error::{QuiverResult, quiver_bail};

use crate::{DictionaryEncoding, Field, Metadata};

/// The ordered top-level fields of a stream or file, plus custom metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    fields: Arc<[Field]>,
    metadata: Metadata,
}

impl Schema {
    /// A schema over `fields` without metadata.
    pub fn new(fields: impl Into<Arc<[Field]>>) -> Self {
        Self {
            fields: fields.into(),
            metadata: Metadata::new(),
        }
    }

    /// A schema without fields.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Replace the custom metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The top-level fields.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Custom key/value metadata.
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of top-level fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no top-level fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The first top-level field called `name`.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Every dictionary encoding in the schema, in pre-order over the field tree.
    pub fn dictionary_encodings(&self) -> Vec<&DictionaryEncoding> {
        let mut encodings = Vec::new();
        for field in self.fields.iter() {
            field.visit_preorder(&mut |f| encodings.extend(f.dictionary()));
        }
        encodings
    }

    /// The encoding declared for dictionary `id`, if any field uses it.
    pub fn find_dictionary(&self, id: i64) -> Option<&DictionaryEncoding> {
        self.dictionary_encodings()
            .into_iter()
            .find(|encoding| encoding.id() == id)
    }

    /// Validate every field, and that no dictionary id is declared twice with different
    /// encodings.
    pub fn validate(&self) -> QuiverResult<()> {
        self.fields.iter().try_for_each(Field::validate)?;
        let encodings = self.dictionary_encodings();
        for (a, b) in encodings.iter().tuple_combinations() {
            if a.id() == b.id() && a != b {
                quiver_bail!(
                    InvalidSerde: "dictionary {} is declared with conflicting encodings {} and {}",
                    a.id(),
                    a,
                    b
                );
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.fields.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArrowType, IntType};

    fn encoded(name: &str, id: i64) -> Field {
        Field::nullable(name, ArrowType::Int(IntType::INT32))
            .with_dictionary(Some(DictionaryEncoding::new(id, false, None)))
    }

    #[test]
    fn dictionary_encodings_are_preorder() {
        let schema = Schema::new(vec![
            encoded("a", 3),
            Field::new_struct("s", vec![encoded("b", 1), encoded("c", 2)], true),
            Field::new_list("l", encoded("item", 5), true),
        ]);
        let ids = schema
            .dictionary_encodings()
            .iter()
            .map(|e| e.id())
            .collect_vec();
        assert_eq!(ids, vec![3, 1, 2, 5]);
        assert!(schema.find_dictionary(2).is_some());
        assert!(schema.find_dictionary(4).is_none());
    }

    #[test]
    fn conflicting_ids_fail_validation() {
        let schema = Schema::new(vec![
            encoded("a", 1),
            Field::nullable("b", ArrowType::Int(IntType::INT8))
                .with_dictionary(Some(DictionaryEncoding::new(1, false, Some(IntType::INT8)))),
        ]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn lookup_by_name() {
        let schema = Schema::new(vec![Field::nullable("x", ArrowType::Bool)]);
        assert_eq!(schema.find_field("x").map(Field::data_type), Some(ArrowType::Bool));
        assert!(schema.find_field("y").is_none());
        assert_eq!(schema.to_string(), "{x: bool?}");
    }
}
