//! Fields: named, typed columns that may nest other fields.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use quiver_error::{QuiverResult, quiver_bail};

use crate::{ArrowType, DictionaryEncoding, Nullability};

/// A name for a field
pub type FieldName = Arc<str>;

/// Custom key/value metadata attached to a schema or field
pub type Metadata = BTreeMap<String, String>;

/// A named, typed column.
///
/// Equality is structural: name, type, nullability, dictionary encoding, children and metadata
/// all take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: FieldName,
    data_type: ArrowType,
    nullability: Nullability,
    dictionary: Option<DictionaryEncoding>,
    children: Arc<[Field]>,
    metadata: Metadata,
}

impl Field {
    /// A field without children, dictionary encoding or metadata.
    pub fn new(
        name: impl Into<FieldName>,
        data_type: ArrowType,
        nullability: impl Into<Nullability>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullability: nullability.into(),
            dictionary: None,
            children: Arc::new([]),
            metadata: Metadata::new(),
        }
    }

    /// A nullable field without children.
    pub fn nullable(name: impl Into<FieldName>, data_type: ArrowType) -> Self {
        Self::new(name, data_type, Nullability::Nullable)
    }

    /// A non-nullable field without children.
    pub fn non_nullable(name: impl Into<FieldName>, data_type: ArrowType) -> Self {
        Self::new(name, data_type, Nullability::NonNullable)
    }

    /// A struct field over `children`.
    pub fn new_struct(
        name: impl Into<FieldName>,
        children: impl Into<Arc<[Field]>>,
        nullability: impl Into<Nullability>,
    ) -> Self {
        Self::new(name, ArrowType::Struct, nullability).with_children(children)
    }

    /// A list field whose items are described by `item`.
    pub fn new_list(
        name: impl Into<FieldName>,
        item: Field,
        nullability: impl Into<Nullability>,
    ) -> Self {
        Self::new(name, ArrowType::List, nullability).with_children(vec![item])
    }

    /// Replace the children.
    pub fn with_children(mut self, children: impl Into<Arc<[Field]>>) -> Self {
        self.children = children.into();
        self
    }

    /// Replace the dictionary encoding.
    pub fn with_dictionary(mut self, dictionary: Option<DictionaryEncoding>) -> Self {
        self.dictionary = dictionary;
        self
    }

    /// Replace the logical type, keeping everything else.
    pub fn with_data_type(mut self, data_type: ArrowType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Replace the name, keeping everything else.
    pub fn with_name(mut self, name: impl Into<FieldName>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the custom metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The field name. May be empty, as for list items written by some producers.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logical type.
    #[inline]
    pub fn data_type(&self) -> ArrowType {
        self.data_type
    }

    /// Whether slots may be null.
    #[inline]
    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    /// Shorthand for `self.nullability().is_nullable()`.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullability.is_nullable()
    }

    /// The dictionary encoding, if the field holds dictionary indices.
    #[inline]
    pub fn dictionary(&self) -> Option<&DictionaryEncoding> {
        self.dictionary.as_ref()
    }

    /// Child fields, in order.
    #[inline]
    pub fn children(&self) -> &[Field] {
        &self.children
    }

    /// Custom key/value metadata.
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Check the number of children against the type, recursively.
    pub fn validate(&self) -> QuiverResult<()> {
        if let Some(expected) = self.data_type.required_children() {
            if self.children.len() != expected {
                quiver_bail!(
                    InvalidSerde: "field {} of type {} must have {} children, found {}",
                    self.name,
                    self.data_type,
                    expected,
                    self.children.len()
                );
            }
        }
        self.children.iter().try_for_each(Field::validate)
    }

    /// Visit this field and its descendants in pre-order.
    pub fn visit_preorder<'a>(&'a self, visit: &mut impl FnMut(&'a Field)) {
        visit(self);
        for child in self.children.iter() {
            child.visit_preorder(visit);
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.data_type)?;
        if !self.children.is_empty() {
            write!(f, "<{}>", self.children.iter().join(", "))?;
        }
        write!(f, "{}", self.nullability)?;
        if let Some(dictionary) = &self.dictionary {
            write!(f, " [{dictionary}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IntType;

    #[test]
    fn structural_equality_includes_dictionary() {
        let plain = Field::nullable("a", ArrowType::Int(IntType::INT32));
        let encoded = plain
            .clone()
            .with_dictionary(Some(DictionaryEncoding::new(1, false, None)));
        assert_ne!(plain, encoded);
        assert_eq!(
            encoded,
            Field::nullable("a", ArrowType::Int(IntType::INT32))
                .with_dictionary(Some(DictionaryEncoding::new(1, false, Some(IntType::INT32))))
        );
    }

    #[test]
    fn list_requires_one_child() {
        let bad = Field::nullable("l", ArrowType::List);
        assert!(bad.validate().is_err());
        let good = Field::new_list("l", Field::nullable("item", ArrowType::Utf8), true);
        good.validate().unwrap();
    }

    #[test]
    fn display() {
        let field = Field::new_struct(
            "s",
            vec![
                Field::nullable("x", ArrowType::Int(IntType::INT8)),
                Field::non_nullable("y", ArrowType::Utf8),
            ],
            true,
        );
        assert_eq!(field.to_string(), "s: struct<x: i8?, y: utf8>?");
    }
}
