use std::fmt::{Display, Formatter};

use crate::IntType;

/// Marks a field as holding indices into the dictionary with the given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DictionaryEncoding {
    id: i64,
    ordered: bool,
    index_type: IntType,
}

impl DictionaryEncoding {
    /// Encoding for dictionary `id`. A missing index type defaults to signed 32-bit.
    pub fn new(id: i64, ordered: bool, index_type: Option<IntType>) -> Self {
        Self {
            id,
            ordered,
            index_type: index_type.unwrap_or(IntType::INT32),
        }
    }

    /// The dictionary id, unique within a schema.
    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the order of dictionary values is meaningful.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// The integer type of the indices.
    #[inline]
    pub fn index_type(&self) -> IntType {
        self.index_type
    }
}

impl Display for DictionaryEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "dict#{}<{}>", self.id, self.index_type)?;
        if self.ordered {
            write!(f, " ordered")?;
        }
        Ok(())
    }
}
