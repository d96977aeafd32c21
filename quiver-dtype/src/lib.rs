#![deny(missing_docs)]

//! The logical type system for Quiver.
//!
//! A [`Schema`] is an ordered list of [`Field`]s. Each field has an [`ArrowType`], a
//! [`Nullability`], child fields for nested types, and optionally a [`DictionaryEncoding`] that
//! marks its values as indices into a separately transmitted dictionary.

pub use arrow_type::*;
pub use dictionary::*;
pub use field::*;
pub use nullability::*;
pub use schema::*;

mod arrow_type;
mod dictionary;
mod field;
mod nullability;
mod schema;
mod serde;

pub mod flatbuffers {
    //! Flatbuffer representations for schemas
    //!
    //! This module contains the code to serialize and deserialize schemas to and from the Arrow
    //! `Schema` flatbuffer table.

    pub use quiver_flatbuffers::schema::*;

    pub use super::serde::flatbuffers::*;
}
