#![deny(missing_docs)]

//! Columnar vectors.
//!
//! A [`Vector`] is the in-memory form of one field of a record batch: a length, a null count, the
//! buffers its [`VectorKind`] declares, and one child vector per child field. Vectors are
//! immutable and share their buffers by reference count, so cloning or slicing them never copies
//! payload bytes. A [`VectorSchemaRoot`] groups one vector per top-level schema field.

pub use kind::*;
pub use native::*;
pub use root::*;
pub use vector::*;

mod builders;
mod compute;
mod kind;
mod native;
mod root;
mod vector;
