use std::fmt::{Display, Formatter};

/// A fixed-width integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntType {
    bit_width: u8,
    signed: bool,
}

impl IntType {
    /// Signed 8-bit integer
    pub const INT8: Self = Self::new(8, true);
    /// Signed 16-bit integer
    pub const INT16: Self = Self::new(16, true);
    /// Signed 32-bit integer, the default dictionary index type
    pub const INT32: Self = Self::new(32, true);
    /// Signed 64-bit integer
    pub const INT64: Self = Self::new(64, true);
    /// Unsigned 8-bit integer
    pub const UINT8: Self = Self::new(8, false);
    /// Unsigned 16-bit integer
    pub const UINT16: Self = Self::new(16, false);
    /// Unsigned 32-bit integer
    pub const UINT32: Self = Self::new(32, false);
    /// Unsigned 64-bit integer
    pub const UINT64: Self = Self::new(64, false);

    /// Build an integer type. Only widths of 8, 16, 32 and 64 bits are meaningful.
    pub const fn new(bit_width: u8, signed: bool) -> Self {
        Self { bit_width, signed }
    }

    /// Width in bits.
    #[inline]
    pub const fn bit_width(&self) -> u8 {
        self.bit_width
    }

    /// Width in bytes.
    #[inline]
    pub const fn byte_width(&self) -> usize {
        self.bit_width as usize / 8
    }

    /// Whether values are two's complement signed.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        self.signed
    }
}

impl Display for IntType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.signed { "i" } else { "u" };
        write!(f, "{prefix}{}", self.bit_width)
    }
}

/// Width of a floating point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Precision {
    /// IEEE 754 binary16
    Half,
    /// IEEE 754 binary32
    Single,
    /// IEEE 754 binary64
    Double,
}

impl Precision {
    /// Width in bits.
    pub const fn bit_width(&self) -> usize {
        match self {
            Self::Half => 16,
            Self::Single => 32,
            Self::Double => 64,
        }
    }
}

/// Resolution of a date type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateUnit {
    /// Days since the UNIX epoch, stored as an `i32`
    Day,
    /// Milliseconds since the UNIX epoch, stored as an `i64`
    Millisecond,
}

/// The logical types a [`crate::Field`] can carry.
///
/// Parameters that belong to the type (bit widths, fixed sizes) live here; nullability, children
/// and dictionary encoding live on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowType {
    /// Every value is null; no buffers are transmitted
    Null,
    /// Bit-packed booleans
    Bool,
    /// Fixed-width integers
    Int(IntType),
    /// IEEE 754 floating point numbers
    FloatingPoint(Precision),
    /// UTF-8 strings with 32-bit offsets
    Utf8,
    /// UTF-8 strings with 64-bit offsets
    LargeUtf8,
    /// Opaque bytes with 32-bit offsets
    Binary,
    /// Opaque bytes with 64-bit offsets
    LargeBinary,
    /// Opaque values of exactly this many bytes
    FixedSizeBinary(i32),
    /// Calendar dates
    Date(DateUnit),
    /// Variable-length lists of the single child field, with 32-bit offsets
    List,
    /// Variable-length lists of the single child field, with 64-bit offsets
    LargeList,
    /// Lists of exactly this many values of the single child field
    FixedSizeList(i32),
    /// One child field per member; values live in the children
    Struct,
}

impl ArrowType {
    /// Whether values of this type are stored in child fields.
    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            Self::List | Self::LargeList | Self::FixedSizeList(_) | Self::Struct
        )
    }

    /// Number of children a field of this type must have, when it is fixed.
    pub fn required_children(&self) -> Option<usize> {
        match self {
            Self::List | Self::LargeList | Self::FixedSizeList(_) => Some(1),
            Self::Struct => None,
            _ => Some(0),
        }
    }

    /// Bits per value for types stored in a single fixed-width data buffer.
    pub fn bit_width(&self) -> Option<usize> {
        match self {
            Self::Bool => Some(1),
            Self::Int(int) => Some(usize::from(int.bit_width())),
            Self::FloatingPoint(precision) => Some(precision.bit_width()),
            Self::Date(DateUnit::Day) => Some(32),
            Self::Date(DateUnit::Millisecond) => Some(64),
            Self::FixedSizeBinary(width) => usize::try_from(*width).ok().map(|w| w * 8),
            _ => None,
        }
    }

    /// Bytes per offset for types that carry an offsets buffer.
    pub fn offset_width(&self) -> Option<usize> {
        match self {
            Self::Utf8 | Self::Binary | Self::List => Some(4),
            Self::LargeUtf8 | Self::LargeBinary | Self::LargeList => Some(8),
            _ => None,
        }
    }

    /// The integer type, for [`ArrowType::Int`].
    pub fn as_int(&self) -> Option<IntType> {
        match self {
            Self::Int(int) => Some(*int),
            _ => None,
        }
    }
}

impl From<IntType> for ArrowType {
    fn from(value: IntType) -> Self {
        Self::Int(value)
    }
}

impl Display for ArrowType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool => write!(f, "bool"),
            Self::Int(int) => write!(f, "{int}"),
            Self::FloatingPoint(Precision::Half) => write!(f, "f16"),
            Self::FloatingPoint(Precision::Single) => write!(f, "f32"),
            Self::FloatingPoint(Precision::Double) => write!(f, "f64"),
            Self::Utf8 => write!(f, "utf8"),
            Self::LargeUtf8 => write!(f, "large_utf8"),
            Self::Binary => write!(f, "binary"),
            Self::LargeBinary => write!(f, "large_binary"),
            Self::FixedSizeBinary(width) => write!(f, "fixed_size_binary({width})"),
            Self::Date(DateUnit::Day) => write!(f, "date32"),
            Self::Date(DateUnit::Millisecond) => write!(f, "date64"),
            Self::List => write!(f, "list"),
            Self::LargeList => write!(f, "large_list"),
            Self::FixedSizeList(size) => write!(f, "fixed_size_list({size})"),
            Self::Struct => write!(f, "struct"),
        }
    }
}
