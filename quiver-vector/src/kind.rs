use quiver_dtype::{ArrowType, DateUnit, Field, IntType};

/// The physical layout of a vector, and with it the number of buffers it carries on the wire.
///
/// Every kind except [`VectorKind::Absence`] starts with a validity bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    /// No buffers at all; every slot is null.
    Absence,
    /// Validity and one data buffer of `bit_width` bits per slot.
    FixedWidth {
        /// Bits per slot; 1 for bit-packed booleans.
        bit_width: usize,
    },
    /// Validity, offsets of `offset_width` bytes, and the concatenated values.
    VariableLength {
        /// Bytes per offset, 4 or 8.
        offset_width: usize,
    },
    /// Validity and, for variable-size lists, offsets into the child vector.
    Nested {
        /// Bytes per offset, or `None` for structs and fixed-size lists.
        offset_width: Option<usize>,
    },
    /// Validity and integer indices into a dictionary.
    DictionaryIndex {
        /// The integer type of the indices.
        index_type: IntType,
    },
}

impl VectorKind {
    /// The layout of vectors for `field`, in memory format.
    ///
    /// A dictionary-encoded field always holds indices, whatever its declared type.
    pub fn of(field: &Field) -> Self {
        if let Some(encoding) = field.dictionary() {
            return Self::DictionaryIndex {
                index_type: encoding.index_type(),
            };
        }
        match field.data_type() {
            ArrowType::Null => Self::Absence,
            ArrowType::Bool => Self::FixedWidth { bit_width: 1 },
            ArrowType::Int(int) => Self::FixedWidth {
                bit_width: usize::from(int.bit_width()),
            },
            ArrowType::FloatingPoint(precision) => Self::FixedWidth {
                bit_width: precision.bit_width(),
            },
            ArrowType::Date(DateUnit::Day) => Self::FixedWidth { bit_width: 32 },
            ArrowType::Date(DateUnit::Millisecond) => Self::FixedWidth { bit_width: 64 },
            ArrowType::FixedSizeBinary(width) => Self::FixedWidth {
                bit_width: usize::try_from(width).unwrap_or_default() * 8,
            },
            ArrowType::Utf8 | ArrowType::Binary => Self::VariableLength { offset_width: 4 },
            ArrowType::LargeUtf8 | ArrowType::LargeBinary => {
                Self::VariableLength { offset_width: 8 }
            }
            ArrowType::List => Self::Nested {
                offset_width: Some(4),
            },
            ArrowType::LargeList => Self::Nested {
                offset_width: Some(8),
            },
            ArrowType::FixedSizeList(_) | ArrowType::Struct => Self::Nested { offset_width: None },
        }
    }

    /// Number of buffers a vector of this kind contributes to a record batch.
    pub const fn buffer_count(&self) -> usize {
        match self {
            Self::Absence => 0,
            Self::FixedWidth { .. } | Self::DictionaryIndex { .. } => 2,
            Self::VariableLength { .. } => 3,
            Self::Nested {
                offset_width: Some(_),
            } => 2,
            Self::Nested { offset_width: None } => 1,
        }
    }

    /// Bits per slot of the data buffer, for fixed-width and index vectors.
    pub fn bit_width(&self) -> Option<usize> {
        match self {
            Self::FixedWidth { bit_width } => Some(*bit_width),
            Self::DictionaryIndex { index_type } => Some(usize::from(index_type.bit_width())),
            _ => None,
        }
    }

    /// Bytes per offset, for vectors that carry an offsets buffer.
    pub fn offset_width(&self) -> Option<usize> {
        match self {
            Self::VariableLength { offset_width } => Some(*offset_width),
            Self::Nested { offset_width } => *offset_width,
            _ => None,
        }
    }
}
