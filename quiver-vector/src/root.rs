use itertools::Itertools;
use quiver_dtype::Schema;
use quiver_error::{QuiverResult, quiver_bail};

use crate::Vector;

/// One vector per top-level field of a schema, plus the number of rows they hold.
///
/// A root is the unit that is unloaded into a record batch and loaded back from one. Loading
/// replaces the vectors wholesale, so a root can be reused across batches.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSchemaRoot {
    schema: Schema,
    vectors: Vec<Vector>,
    row_count: usize,
}

impl VectorSchemaRoot {
    /// An empty root for `schema`.
    pub fn create(schema: Schema) -> Self {
        let vectors = schema.fields().iter().cloned().map(Vector::empty).collect();
        Self {
            schema,
            vectors,
            row_count: 0,
        }
    }

    /// A root over `vectors`, whose fields become the schema.
    pub fn try_new(vectors: Vec<Vector>) -> QuiverResult<Self> {
        let schema = Schema::new(
            vectors
                .iter()
                .map(|vector| vector.field().clone())
                .collect_vec(),
        );
        Self::try_with_schema(schema, vectors)
    }

    /// A root over `vectors` described by `schema`, which may carry metadata.
    pub fn try_with_schema(schema: Schema, vectors: Vec<Vector>) -> QuiverResult<Self> {
        let row_count = vectors.first().map(Vector::len).unwrap_or_default();
        let mut root = Self::create(schema);
        root.replace_vectors(vectors, row_count)?;
        Ok(root)
    }

    /// Swap in a new set of vectors holding `row_count` rows.
    ///
    /// The vectors must match the schema's fields one to one and hold at least `row_count` slots.
    pub fn replace_vectors(&mut self, vectors: Vec<Vector>, row_count: usize) -> QuiverResult<()> {
        if vectors.len() != self.schema.len() {
            quiver_bail!(
                SchemaMismatch: "schema has {} fields, got {} vectors",
                self.schema.len(),
                vectors.len()
            );
        }
        for (vector, field) in vectors.iter().zip_eq(self.schema.fields()) {
            if vector.field() != field {
                quiver_bail!(
                    SchemaMismatch: "vector {} does not match field {}",
                    vector.field(),
                    field
                );
            }
            if vector.len() < row_count {
                quiver_bail!(
                    SchemaMismatch: "vector {} holds {} rows, the batch has {}",
                    field,
                    vector.len(),
                    row_count
                );
            }
        }
        self.vectors = vectors;
        self.row_count = row_count;
        Ok(())
    }

    /// Drop the loaded vectors, leaving an empty root.
    pub fn clear(&mut self) {
        *self = Self::create(self.schema.clone());
    }

    /// The schema.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The vectors, in schema order.
    #[inline]
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// The vector of the first top-level field called `name`.
    pub fn vector(&self, name: &str) -> Option<&Vector> {
        self.vectors.iter().find(|vector| vector.name() == name)
    }

    /// Number of rows in the current batch.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}
