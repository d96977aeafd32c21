//! Dictionaries: lookup tables that dictionary-encoded fields index into.
//!
//! In memory a dictionary-encoded field holds integer indices and names its dictionary by id; the
//! values live in a [`Dictionary`] held by a [`DictionaryProvider`]. On the wire the field carries
//! the value type instead, see [`to_message_format`] and [`to_memory_format`].

mod encoder;
mod format;
mod provider;

use std::fmt::{Display, Formatter};

pub use encoder::*;
pub use format::*;
pub use provider::*;
use quiver_dtype::{DictionaryEncoding, Field};
use quiver_vector::Vector;

/// The values of one dictionary and the encoding that names it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    vector: Vector,
    encoding: DictionaryEncoding,
}

impl Dictionary {
    pub fn new(vector: Vector, encoding: DictionaryEncoding) -> Self {
        Self { vector, encoding }
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.encoding.id()
    }

    /// The dictionary values.
    #[inline]
    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    #[inline]
    pub fn encoding(&self) -> &DictionaryEncoding {
        &self.encoding
    }

    /// The field describing the values.
    #[inline]
    pub fn value_field(&self) -> &Field {
        self.vector.field()
    }

    pub fn into_vector(self) -> Vector {
        self.vector
    }
}

impl Display for Dictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dictionary {} of {} {} values",
            self.encoding,
            self.vector.len(),
            self.vector.field().data_type()
        )
    }
}
