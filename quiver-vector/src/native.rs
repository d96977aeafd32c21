use std::fmt::Debug;

use quiver_dtype::{ArrowType, IntType, Precision};

/// A Rust primitive that maps onto a fixed-width Arrow type.
pub trait NativeType: Copy + Debug + Default + PartialEq + Send + Sync + 'static {
    /// The Arrow type of a vector holding this primitive.
    const ARROW_TYPE: ArrowType;

    /// Decode one value from exactly `size_of::<Self>()` little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Append the little-endian encoding of `self`.
    fn extend_le(self, out: &mut Vec<u8>);
}

macro_rules! native_type {
    ($T:ty, $arrow:expr) => {
        impl NativeType for $T {
            const ARROW_TYPE: ArrowType = $arrow;

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut le = [0u8; size_of::<$T>()];
                le.copy_from_slice(bytes);
                <$T>::from_le_bytes(le)
            }

            #[inline]
            fn extend_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }
        }
    };
}

native_type!(i8, ArrowType::Int(IntType::INT8));
native_type!(i16, ArrowType::Int(IntType::INT16));
native_type!(i32, ArrowType::Int(IntType::INT32));
native_type!(i64, ArrowType::Int(IntType::INT64));
native_type!(u8, ArrowType::Int(IntType::UINT8));
native_type!(u16, ArrowType::Int(IntType::UINT16));
native_type!(u32, ArrowType::Int(IntType::UINT32));
native_type!(u64, ArrowType::Int(IntType::UINT64));
native_type!(f32, ArrowType::FloatingPoint(Precision::Single));
native_type!(f64, ArrowType::FloatingPoint(Precision::Double));

/// Widen an integer of type `int` stored little-endian in `bytes`.
pub(crate) fn read_integer(bytes: &[u8], int: IntType) -> i128 {
    match (int.bit_width(), int.is_signed()) {
        (8, true) => i8::from_le_slice(bytes).into(),
        (8, false) => u8::from_le_slice(bytes).into(),
        (16, true) => i16::from_le_slice(bytes).into(),
        (16, false) => u16::from_le_slice(bytes).into(),
        (32, true) => i32::from_le_slice(bytes).into(),
        (32, false) => u32::from_le_slice(bytes).into(),
        (_, true) => i64::from_le_slice(bytes).into(),
        (_, false) => u64::from_le_slice(bytes).into(),
    }
}

/// Narrow `value` into `int`, little-endian, or `None` if it does not fit.
pub(crate) fn write_integer(value: i128, int: IntType, out: &mut Vec<u8>) -> Option<()> {
    match (int.bit_width(), int.is_signed()) {
        (8, true) => i8::try_from(value).ok()?.extend_le(out),
        (8, false) => u8::try_from(value).ok()?.extend_le(out),
        (16, true) => i16::try_from(value).ok()?.extend_le(out),
        (16, false) => u16::try_from(value).ok()?.extend_le(out),
        (32, true) => i32::try_from(value).ok()?.extend_le(out),
        (32, false) => u32::try_from(value).ok()?.extend_le(out),
        (_, true) => i64::try_from(value).ok()?.extend_le(out),
        (_, false) => u64::try_from(value).ok()?.extend_le(out),
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_and_narrow() {
        let mut out = Vec::new();
        write_integer(-2, IntType::INT16, &mut out).unwrap();
        assert_eq!(out, vec![0xfe, 0xff]);
        assert_eq!(read_integer(&out, IntType::INT16), -2);
        assert_eq!(read_integer(&out, IntType::UINT16), 65534);
        assert!(write_integer(300, IntType::UINT8, &mut out).is_none());
        assert!(write_integer(-1, IntType::UINT32, &mut out).is_none());
    }
}
