use std::fmt::{Display, Formatter};

use itertools::Itertools;
use quiver_buffer::ByteBuffer;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_flatbuffers::file::Block;
use quiver_io::{ALIGNMENT, padding_for};

/// Length and null count of one vector in a record batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowFieldNode {
    length: usize,
    null_count: usize,
}

impl ArrowFieldNode {
    /// A node of `length` slots, `null_count` of them null.
    pub fn try_new(length: usize, null_count: usize) -> QuiverResult<Self> {
        if null_count > length {
            quiver_bail!(
                InvalidSerde: "field node has {} nulls in {} slots",
                null_count,
                length
            );
        }
        Ok(Self { length, null_count })
    }

    /// A node as stored in a message, where both counts are signed.
    pub fn try_from_wire(length: i64, null_count: i64) -> QuiverResult<Self> {
        let length = usize::try_from(length)
            .map_err(|_| quiver_err!(InvalidSerde: "negative field node length {}", length))?;
        let null_count = usize::try_from(null_count).map_err(
            |_| quiver_err!(InvalidSerde: "negative field node null count {}", null_count),
        )?;
        Self::try_new(length, null_count)
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.null_count
    }
}

impl Display for ArrowFieldNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.length, self.null_count)
    }
}

/// Where a buffer sits in a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowBuffer {
    pub offset: u64,
    pub length: u64,
}

/// A flattened record batch: one node per vector and the buffers of every vector, both in
/// pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowRecordBatch {
    length: usize,
    nodes: Vec<ArrowFieldNode>,
    buffers: Vec<ByteBuffer>,
}

impl ArrowRecordBatch {
    pub fn new(length: usize, nodes: Vec<ArrowFieldNode>, buffers: Vec<ByteBuffer>) -> Self {
        Self {
            length,
            nodes,
            buffers,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn nodes(&self) -> &[ArrowFieldNode] {
        &self.nodes
    }

    #[inline]
    pub fn buffers(&self) -> &[ByteBuffer] {
        &self.buffers
    }

    /// The position of every buffer in the body, each starting on an 8-byte boundary.
    pub fn buffer_layout(&self) -> Vec<ArrowBuffer> {
        let mut offset = 0u64;
        self.buffers
            .iter()
            .map(|buffer| {
                let length = buffer.len() as u64;
                let layout = ArrowBuffer { offset, length };
                offset += length + padding_for(length) as u64;
                layout
            })
            .collect_vec()
    }

    /// Size of the body: every buffer rounded up to a multiple of 8.
    pub fn compute_body_length(&self) -> u64 {
        self.buffers
            .iter()
            .map(|buffer| buffer.padded_len(ALIGNMENT) as u64)
            .sum()
    }
}

/// A dictionary's values, carried as a single-column record batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowDictionaryBatch {
    id: i64,
    is_delta: bool,
    data: ArrowRecordBatch,
}

impl ArrowDictionaryBatch {
    pub fn new(id: i64, data: ArrowRecordBatch, is_delta: bool) -> Self {
        Self { id, is_delta, data }
    }

    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Whether the values extend the dictionary instead of replacing it.
    #[inline]
    pub fn is_delta(&self) -> bool {
        self.is_delta
    }

    #[inline]
    pub fn data(&self) -> &ArrowRecordBatch {
        &self.data
    }

    pub fn into_data(self) -> ArrowRecordBatch {
        self.data
    }
}

/// The location of one message in a file. `metadata_length` covers the framing prefix, the
/// metadata and its padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrowBlock {
    offset: u64,
    metadata_length: u32,
    body_length: u64,
}

impl ArrowBlock {
    pub fn new(offset: u64, metadata_length: u32, body_length: u64) -> Self {
        Self {
            offset,
            metadata_length,
            body_length,
        }
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn metadata_length(&self) -> u32 {
        self.metadata_length
    }

    #[inline]
    pub fn body_length(&self) -> u64 {
        self.body_length
    }

    /// Offset just past the message body, saturating at `u64::MAX` for blocks read off the wire.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset
            .saturating_add(u64::from(self.metadata_length))
            .saturating_add(self.body_length)
    }

    /// The footer's representation of this block.
    pub fn to_flatbuffer(&self) -> QuiverResult<Block> {
        Ok(Block::new(
            i64::try_from(self.offset)
                .map_err(|_| quiver_err!(Framing: "block offset {} overflows", self.offset))?,
            i32::try_from(self.metadata_length).map_err(
                |_| quiver_err!(Framing: "block metadata length {} overflows", self.metadata_length),
            )?,
            i64::try_from(self.body_length).map_err(
                |_| quiver_err!(Framing: "block body length {} overflows", self.body_length),
            )?,
        ))
    }

    /// Read a block from the footer, rejecting negative fields.
    pub fn try_from_flatbuffer(block: &Block) -> QuiverResult<Self> {
        let offset = u64::try_from(block.offset())
            .map_err(|_| quiver_err!(InvalidSerde: "negative block offset {}", block.offset()))?;
        let metadata_length = u32::try_from(block.meta_data_length()).map_err(|_| {
            quiver_err!(
                InvalidSerde: "negative block metadata length {}",
                block.meta_data_length()
            )
        })?;
        let body_length = u64::try_from(block.body_length()).map_err(|_| {
            quiver_err!(InvalidSerde: "negative block body length {}", block.body_length())
        })?;
        Ok(Self::new(offset, metadata_length, body_length))
    }
}

impl Display for ArrowBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "block@{} (metadata {}, body {})",
            self.offset, self.metadata_length, self.body_length
        )
    }
}
