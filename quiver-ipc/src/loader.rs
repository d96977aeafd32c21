//! Moving vectors in and out of flattened record batches.
//!
//! Both directions walk the vectors depth first, parent before children. Every vector
//! contributes one [`ArrowFieldNode`] and exactly [`VectorKind::buffer_count`] buffers.
//!
//! [`VectorKind::buffer_count`]: quiver_vector::VectorKind::buffer_count

use std::slice;

use quiver_buffer::ByteBuffer;
use quiver_dtype::Schema;
use quiver_error::{QuiverResult, quiver_bail};
use quiver_vector::{Vector, VectorSchemaRoot};

use crate::{ArrowFieldNode, ArrowRecordBatch};

/// Flattens the vectors of a root into a record batch.
#[derive(Debug)]
pub struct VectorUnloader<'a> {
    root: &'a VectorSchemaRoot,
}

impl<'a> VectorUnloader<'a> {
    pub fn new(root: &'a VectorSchemaRoot) -> Self {
        Self { root }
    }

    /// The record batch for the root's current rows. Buffers are shared, not copied.
    pub fn record_batch(&self) -> QuiverResult<ArrowRecordBatch> {
        let mut nodes = Vec::new();
        let mut buffers = Vec::new();
        for vector in self.root.vectors() {
            append_nodes(vector, &mut nodes, &mut buffers)?;
        }
        Ok(ArrowRecordBatch::new(self.root.row_count(), nodes, buffers))
    }
}

fn append_nodes(
    vector: &Vector,
    nodes: &mut Vec<ArrowFieldNode>,
    buffers: &mut Vec<ByteBuffer>,
) -> QuiverResult<()> {
    let expected = vector.kind().buffer_count();
    if vector.buffers().len() != expected {
        quiver_bail!(
            SchemaMismatch: "vector {} holds {} buffers, its kind has {}",
            vector.field(),
            vector.buffers().len(),
            expected
        );
    }
    nodes.push(ArrowFieldNode::try_new(vector.len(), vector.null_count())?);
    buffers.extend(vector.buffers().iter().cloned());
    for child in vector.children() {
        append_nodes(child, nodes, buffers)?;
    }
    Ok(())
}

/// Loads record batches into a root.
#[derive(Debug)]
pub struct VectorLoader<'a> {
    root: &'a mut VectorSchemaRoot,
}

impl<'a> VectorLoader<'a> {
    pub fn new(root: &'a mut VectorSchemaRoot) -> Self {
        Self { root }
    }

    /// Replace the root's vectors with those of `batch`. On error the root is unchanged.
    pub fn load(&mut self, batch: &ArrowRecordBatch) -> QuiverResult<()> {
        let vectors = load_vectors(self.root.schema(), batch)?;
        self.root.replace_vectors(vectors, batch.length())
    }
}

/// Build one vector per field of `schema` from the nodes and buffers of `batch`.
pub fn load_vectors(schema: &Schema, batch: &ArrowRecordBatch) -> QuiverResult<Vec<Vector>> {
    let mut nodes = batch.nodes().iter();
    let mut buffers = batch.buffers().iter();
    let mut vectors = schema
        .fields()
        .iter()
        .cloned()
        .map(Vector::empty)
        .collect::<Vec<_>>();
    for vector in &mut vectors {
        load_vector(vector, &mut nodes, &mut buffers)?;
    }

    if !nodes.as_slice().is_empty() || !buffers.as_slice().is_empty() {
        quiver_bail!(
            SchemaMismatch: "{} field nodes and {} buffers left over after loading {}",
            nodes.len(),
            buffers.len(),
            schema
        );
    }
    for vector in &vectors {
        vector.validate()?;
    }
    Ok(vectors)
}

fn load_vector(
    vector: &mut Vector,
    nodes: &mut slice::Iter<ArrowFieldNode>,
    buffers: &mut slice::Iter<ByteBuffer>,
) -> QuiverResult<()> {
    let Some(node) = nodes.next() else {
        quiver_bail!(SchemaMismatch: "no field node left for {}", vector.field());
    };
    let count = vector.kind().buffer_count();
    if buffers.len() < count {
        quiver_bail!(
            SchemaMismatch: "{} needs {} buffers, {} are left",
            vector.field(),
            count,
            buffers.len()
        );
    }
    let own = buffers.by_ref().take(count).cloned().collect();
    vector.load_field_buffers(node.length(), node.null_count(), own)?;
    for child in vector.children_mut() {
        load_vector(child, nodes, buffers)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use quiver_dtype::{ArrowType, Field, IntType};
    use quiver_error::QuiverError;
    use rstest::rstest;

    use super::*;

    fn int8_root() -> VectorSchemaRoot {
        VectorSchemaRoot::create(Schema::new(vec![Field::nullable(
            "testField",
            ArrowType::Int(IntType::INT8),
        )]))
    }

    fn sixteen_rows() -> ArrowRecordBatch {
        ArrowRecordBatch::new(
            16,
            vec![ArrowFieldNode::try_new(16, 8).unwrap()],
            vec![
                ByteBuffer::copy_from([0xff, 0x00]),
                ByteBuffer::copy_from((1..=16).collect::<Vec<u8>>()),
            ],
        )
    }

    #[test]
    fn load_sixteen_rows() {
        let mut root = int8_root();
        VectorLoader::new(&mut root).load(&sixteen_rows()).unwrap();
        assert_eq!(root.row_count(), 16);
        let vector = &root.vectors()[0];
        assert_eq!(vector.null_count(), 8);
        assert_eq!(vector.value::<i8>(0), Some(1));
        assert_eq!(vector.value::<i8>(7), Some(8));
        assert_eq!(vector.value::<i8>(8), None);

        let batch = VectorUnloader::new(&root).record_batch().unwrap();
        assert_eq!(batch, sixteen_rows());
    }

    #[test]
    fn missing_buffer_leaves_root_untouched() {
        let mut root = int8_root();
        let batch = ArrowRecordBatch::new(
            16,
            vec![ArrowFieldNode::try_new(16, 8).unwrap()],
            vec![ByteBuffer::copy_from([0xff, 0x00])],
        );
        let err = VectorLoader::new(&mut root).load(&batch).unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
        assert_eq!(root.row_count(), 0);
    }

    #[test]
    fn leftovers_are_rejected() {
        let mut root = int8_root();
        let base = sixteen_rows();
        let batch = ArrowRecordBatch::new(
            base.length(),
            base.nodes().to_vec(),
            [base.buffers(), &[ByteBuffer::empty()]].concat(),
        );
        let err = VectorLoader::new(&mut root).load(&batch).unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn nested_round_trip() {
        let items = Vector::try_from_strs("item", [Some("a"), None, Some("bc")]).unwrap();
        let list = Vector::try_new_list("l", &[0, 1, 3], &[true, true], items).unwrap();
        let nulls = Vector::nulls("n", 2);
        let root = VectorSchemaRoot::try_new(vec![
            Vector::try_new_struct("s", vec![list, nulls]).unwrap(),
        ])
        .unwrap();

        let batch = VectorUnloader::new(&root).record_batch().unwrap();
        // struct, list, utf8, null
        assert_eq!(batch.nodes().len(), 4);
        assert_eq!(batch.buffers().len(), 1 + 2 + 3);
        assert_eq!(batch.nodes()[3], ArrowFieldNode::try_new(2, 2).unwrap());

        let mut loaded = VectorSchemaRoot::create(root.schema().clone());
        VectorLoader::new(&mut loaded).load(&batch).unwrap();
        assert_eq!(loaded, root);
    }

    #[rstest]
    #[case::int64(ArrowType::Int(IntType::INT64), 2, 1 << 62)]
    #[case::utf8(ArrowType::Utf8, 3, i64::MAX)]
    #[case::large_utf8(ArrowType::LargeUtf8, 3, 1 << 61)]
    fn huge_node_lengths_are_rejected(
        #[case] data_type: ArrowType,
        #[case] buffer_count: usize,
        #[case] length: i64,
    ) {
        let mut root = VectorSchemaRoot::create(Schema::new(vec![Field::nullable("x", data_type)]));
        let batch = ArrowRecordBatch::new(
            0,
            vec![ArrowFieldNode::try_from_wire(length, 0).unwrap()],
            vec![ByteBuffer::empty(); buffer_count],
        );
        let err = VectorLoader::new(&mut root).load(&batch).unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
        assert_eq!(root.row_count(), 0);
    }
}
