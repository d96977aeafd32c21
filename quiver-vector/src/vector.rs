use std::hash::{Hash, Hasher};
use std::ops::Range;

use itertools::Itertools;
use quiver_buffer::{ByteBuffer, bytes_for_bits, get_bit};
use quiver_dtype::{ArrowType, Field};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};

use crate::native::read_integer;
use crate::{NativeType, VectorKind};

/// One column of a record batch.
///
/// The buffers follow the layout of the field's [`VectorKind`]: for example a `utf8` vector
/// holds validity, offsets and values, in that order. Buffers are only ever read, so a vector
/// can share them with the message body it was decoded from.
#[derive(Debug, Clone)]
pub struct Vector {
    field: Field,
    len: usize,
    null_count: usize,
    buffers: Vec<ByteBuffer>,
    children: Vec<Vector>,
}

impl Vector {
    /// A zero-length vector for `field`, with empty buffers and empty children.
    pub fn empty(field: Field) -> Self {
        let kind = VectorKind::of(&field);
        let children = field.children().iter().cloned().map(Vector::empty).collect();
        Self {
            field,
            len: 0,
            null_count: 0,
            buffers: vec![ByteBuffer::empty(); kind.buffer_count()],
            children,
        }
    }

    /// Assemble a vector from its parts, checking the buffers and children against the field.
    pub fn try_new(
        field: Field,
        len: usize,
        null_count: usize,
        buffers: Vec<ByteBuffer>,
        children: Vec<Vector>,
    ) -> QuiverResult<Self> {
        let mut vector = Self::empty(field);
        vector.load_field_buffers(len, null_count, buffers)?;
        vector.children = children;
        vector.validate()?;
        Ok(vector)
    }

    /// Assemble a vector the caller has already built consistently.
    pub(crate) fn new_unchecked(
        field: Field,
        len: usize,
        null_count: usize,
        buffers: Vec<ByteBuffer>,
        children: Vec<Vector>,
    ) -> Self {
        debug_assert_eq!(buffers.len(), VectorKind::of(&field).buffer_count());
        Self {
            field,
            len,
            null_count,
            buffers,
            children,
        }
    }

    /// Replace this vector's own length, null count and buffers. Children are left untouched.
    ///
    /// The buffers must match the arity of the vector's kind and be long enough for `len` slots.
    /// On error the vector is unchanged.
    pub fn load_field_buffers(
        &mut self,
        len: usize,
        null_count: usize,
        buffers: Vec<ByteBuffer>,
    ) -> QuiverResult<()> {
        let kind = self.kind();
        if buffers.len() != kind.buffer_count() {
            quiver_bail!(
                SchemaMismatch: "field {} expects {} buffers, got {}",
                self.field,
                kind.buffer_count(),
                buffers.len()
            );
        }
        if null_count > len {
            quiver_bail!(
                SchemaMismatch: "field {} has {} nulls in {} rows",
                self.field,
                null_count,
                len
            );
        }
        check_buffers(&self.field, kind, len, null_count, &buffers)?;

        self.len = len;
        self.null_count = match kind {
            VectorKind::Absence => len,
            _ => null_count,
        };
        self.buffers = buffers;
        Ok(())
    }

    /// Check children against the field and against this vector's offsets, recursively.
    pub fn validate(&self) -> QuiverResult<()> {
        let expected = self.field.children();
        if self.children.len() != expected.len() {
            quiver_bail!(
                SchemaMismatch: "field {} expects {} children, got {}",
                self.field,
                expected.len(),
                self.children.len()
            );
        }
        for (child, field) in self.children.iter().zip_eq(expected) {
            if child.field() != field {
                quiver_bail!(
                    SchemaMismatch: "child {} of {} does not match field {}",
                    child.field(),
                    self.field,
                    field
                );
            }
        }

        let required = match self.field.data_type() {
            ArrowType::Struct => self.len,
            ArrowType::FixedSizeList(size) => usize::try_from(size)
                .ok()
                .and_then(|size| self.len.checked_mul(size))
                .ok_or_else(|| {
                    quiver_err!(
                        SchemaMismatch: "{} rows of {} overflow the child length",
                        self.len,
                        self.field
                    )
                })?,
            ArrowType::List | ArrowType::LargeList if self.len > 0 => self.offset(self.len),
            _ => 0,
        };
        if let Some(short) = self.children.iter().find(|child| child.len() < required) {
            quiver_bail!(
                SchemaMismatch: "child {} of {} holds {} rows, {} are referenced",
                short.field(),
                self.field,
                short.len(),
                required
            );
        }

        self.children.iter().try_for_each(Vector::validate)
    }

    /// The field this vector holds values for.
    #[inline]
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The field name.
    #[inline]
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// The physical layout.
    #[inline]
    pub fn kind(&self) -> VectorKind {
        VectorKind::of(&self.field)
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of null slots, as recorded in the field node.
    #[inline]
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// The buffers in wire order.
    #[inline]
    pub fn buffers(&self) -> &[ByteBuffer] {
        &self.buffers
    }

    /// Child vectors, one per child field.
    #[inline]
    pub fn children(&self) -> &[Vector] {
        &self.children
    }

    /// Mutable access to the children, for loading them in place.
    ///
    /// Call [`Vector::validate`] once the children are loaded.
    #[inline]
    pub fn children_mut(&mut self) -> &mut [Vector] {
        &mut self.children
    }

    /// The same buffers described by another, layout-compatible field.
    pub fn with_field(self, field: Field) -> QuiverResult<Self> {
        if !same_layout(&self.field, &field) {
            quiver_bail!(
                SchemaMismatch: "field {} does not share the layout of {}",
                field,
                self.field
            );
        }
        let children: Vec<Vector> = self
            .children
            .into_iter()
            .zip_eq(field.children().iter().cloned())
            .map(|(child, field)| child.with_field(field))
            .try_collect()?;
        Ok(Self {
            field,
            children,
            ..self
        })
    }

    /// The validity bitmap. Absent for [`VectorKind::Absence`], and possibly empty when there are
    /// no nulls.
    pub fn validity(&self) -> Option<&ByteBuffer> {
        match self.kind() {
            VectorKind::Absence => None,
            _ => self.buffers.first(),
        }
    }

    /// The offsets buffer, for variable-length vectors and lists.
    pub fn offsets(&self) -> Option<&ByteBuffer> {
        self.kind().offset_width().and(self.buffers.get(1))
    }

    /// The buffer holding the slot values, for fixed-width, index and variable-length vectors.
    pub fn data(&self) -> Option<&ByteBuffer> {
        match self.kind() {
            VectorKind::FixedWidth { .. } | VectorKind::DictionaryIndex { .. } => {
                self.buffers.get(1)
            }
            VectorKind::VariableLength { .. } => self.buffers.get(2),
            _ => None,
        }
    }

    /// Whether slot `index` holds a value.
    pub fn is_valid(&self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        match self.kind() {
            VectorKind::Absence => false,
            _ if self.null_count == 0 => true,
            _ => self
                .validity()
                .is_some_and(|validity| get_bit(validity, index)),
        }
    }

    /// Whether slot `index` is null. Out of range slots are null.
    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        !self.is_valid(index)
    }

    /// The value at `index`, or `None` if the slot is null or `T` is not the vector's width.
    pub fn value<T: NativeType>(&self, index: usize) -> Option<T> {
        if !self.is_valid(index) {
            return None;
        }
        self.fixed_slot(index, size_of::<T>())
            .map(T::from_le_slice)
    }

    /// The boolean at `index`, or `None` if the slot is null or the vector is not boolean.
    pub fn bool_value(&self, index: usize) -> Option<bool> {
        if !self.is_valid(index) || self.kind() != (VectorKind::FixedWidth { bit_width: 1 }) {
            return None;
        }
        self.data().map(|data| get_bit(data, index))
    }

    /// The integer at `index` of an integer or dictionary index vector.
    pub fn integer_at(&self, index: usize) -> Option<i128> {
        if !self.is_valid(index) {
            return None;
        }
        let int = match self.kind() {
            VectorKind::DictionaryIndex { index_type } => index_type,
            _ => self.field.data_type().as_int()?,
        };
        self.fixed_slot(index, int.byte_width())
            .map(|bytes| read_integer(bytes, int))
    }

    /// The bytes at `index` of a binary, string or fixed-size binary vector.
    pub fn value_bytes(&self, index: usize) -> Option<&[u8]> {
        if !self.is_valid(index) {
            return None;
        }
        match (self.kind(), self.field.data_type()) {
            (VectorKind::VariableLength { .. }, _) => self.raw_bytes(index),
            (VectorKind::FixedWidth { bit_width }, ArrowType::FixedSizeBinary(_)) => {
                self.fixed_slot(index, bit_width / 8)
            }
            _ => None,
        }
    }

    /// The string at `index` of a `utf8` vector.
    pub fn str_value(&self, index: usize) -> Option<&str> {
        self.value_bytes(index)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// The slots of the child vector that list `index` spans. Null lists may span any range.
    pub fn list_range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.len {
            return None;
        }
        match (self.kind(), self.field.data_type()) {
            (VectorKind::Nested { offset_width: Some(_) }, _) => {
                Some(self.offset(index)..self.offset(index + 1))
            }
            (_, ArrowType::FixedSizeList(size)) => {
                let size = usize::try_from(size).ok()?;
                Some(index * size..(index + 1) * size)
            }
            _ => None,
        }
    }

    /// The dictionary index at `index`, or `None` for a null slot.
    pub fn dictionary_index(&self, index: usize) -> QuiverResult<Option<usize>> {
        if !matches!(self.kind(), VectorKind::DictionaryIndex { .. }) {
            quiver_bail!("field {} does not hold dictionary indices", self.field);
        }
        self.integer_at(index)
            .map(|value| {
                usize::try_from(value).map_err(|_| {
                    quiver_err!(
                        DictionaryResolution: "negative dictionary index {} in {}",
                        value,
                        self.field
                    )
                })
            })
            .transpose()
    }

    /// Raw bytes of a fixed-width slot, ignoring validity.
    pub(crate) fn fixed_slot(&self, index: usize, byte_width: usize) -> Option<&[u8]> {
        if self.kind().bit_width() != Some(byte_width * 8) {
            return None;
        }
        self.data()?
            .get(index * byte_width..(index + 1) * byte_width)
    }

    /// Raw bytes of a variable-length slot, ignoring validity.
    pub(crate) fn raw_bytes(&self, index: usize) -> Option<&[u8]> {
        let range = self.offset(index)..self.offset(index + 1);
        self.data()?.get(range)
    }

    /// Offset `index`, read from a loaded offsets buffer. Validation keeps these non-negative.
    pub(crate) fn offset(&self, index: usize) -> usize {
        match (self.offsets(), self.kind().offset_width()) {
            (Some(offsets), Some(width)) => read_offset(offsets, width, index)
                .and_then(|offset| usize::try_from(offset).ok())
                .unwrap_or_default(),
            _ => 0,
        }
    }

    /// Whether slot `index` of `self` and slot `other_index` of `other` hold the same logical
    /// value. Both vectors must share a layout.
    pub fn value_eq(&self, index: usize, other: &Vector, other_index: usize) -> bool {
        let valid = self.is_valid(index);
        if valid != other.is_valid(other_index) {
            return false;
        }
        if !valid {
            return true;
        }
        match self.kind() {
            VectorKind::Absence => true,
            VectorKind::FixedWidth { bit_width: 1 } => {
                self.bool_value(index) == other.bool_value(other_index)
            }
            VectorKind::FixedWidth { bit_width } => {
                self.fixed_slot(index, bit_width / 8) == other.fixed_slot(other_index, bit_width / 8)
            }
            VectorKind::DictionaryIndex { index_type } => {
                self.fixed_slot(index, index_type.byte_width())
                    == other.fixed_slot(other_index, index_type.byte_width())
            }
            VectorKind::VariableLength { .. } => {
                self.raw_bytes(index) == other.raw_bytes(other_index)
            }
            VectorKind::Nested { .. } => match (self.list_range(index), other.list_range(other_index)) {
                (Some(ours), Some(theirs)) => {
                    ours.len() == theirs.len()
                        && self.children.iter().zip(&other.children).all(|(a, b)| {
                            ours.clone().zip(theirs.clone()).all(|(i, j)| a.value_eq(i, b, j))
                        })
                }
                _ => self
                    .children
                    .iter()
                    .zip(&other.children)
                    .all(|(a, b)| a.value_eq(index, b, other_index)),
            },
        }
    }

    /// Feed the logical value at `index` into `state`. Slots that are [`Vector::value_eq`] hash
    /// identically.
    pub fn hash_value<H: Hasher>(&self, index: usize, state: &mut H) {
        let valid = self.is_valid(index);
        valid.hash(state);
        if !valid {
            return;
        }
        match self.kind() {
            VectorKind::Absence => {}
            VectorKind::FixedWidth { bit_width: 1 } => self.bool_value(index).hash(state),
            VectorKind::FixedWidth { .. } | VectorKind::DictionaryIndex { .. } => {
                let byte_width = self.kind().bit_width().unwrap_or_default() / 8;
                self.fixed_slot(index, byte_width).hash(state);
            }
            VectorKind::VariableLength { .. } => self.raw_bytes(index).hash(state),
            VectorKind::Nested { .. } => match self.list_range(index) {
                Some(range) => {
                    range.len().hash(state);
                    for child in &self.children {
                        range.clone().for_each(|i| child.hash_value(i, state));
                    }
                }
                None => self
                    .children
                    .iter()
                    .for_each(|child| child.hash_value(index, state)),
            },
        }
    }
}

/// Logical equality: same field, length and null count, and equal values in every valid slot.
/// Bytes behind null slots and beyond the length are ignored.
impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.len == other.len
            && self.null_count == other.null_count
            && self.children.len() == other.children.len()
            && (0..self.len).all(|index| self.value_eq(index, other, index))
    }
}

/// Whether vectors of `a` and `b` lay out their buffers identically.
pub(crate) fn same_layout(a: &Field, b: &Field) -> bool {
    a.data_type() == b.data_type()
        && a.dictionary() == b.dictionary()
        && a.children().len() == b.children().len()
        && a.children()
            .iter()
            .zip(b.children())
            .all(|(a, b)| same_layout(a, b))
}

fn read_offset(offsets: &[u8], width: usize, index: usize) -> Option<i64> {
    let bytes = offsets.get(index * width..(index + 1) * width)?;
    Some(match width {
        4 => i64::from(i32::from_le_slice(bytes)),
        _ => i64::from_le_slice(bytes),
    })
}

fn check_buffers(
    field: &Field,
    kind: VectorKind,
    len: usize,
    null_count: usize,
    buffers: &[ByteBuffer],
) -> QuiverResult<()> {
    if kind == VectorKind::Absence {
        return Ok(());
    }

    let validity = &buffers[0];
    if (null_count > 0 || !validity.is_empty()) && validity.len() < bytes_for_bits(len) {
        quiver_bail!(
            SchemaMismatch: "validity of {} holds {} bytes, {} rows need {}",
            field,
            validity.len(),
            len,
            bytes_for_bits(len)
        );
    }

    if let Some(bit_width) = kind.bit_width() {
        let needed = len.checked_mul(bit_width).map(bytes_for_bits).ok_or_else(|| {
            quiver_err!(SchemaMismatch: "{} rows of {} overflow the data size", len, field)
        })?;
        if buffers[1].len() < needed {
            quiver_bail!(
                SchemaMismatch: "data of {} holds {} bytes, {} rows need {}",
                field,
                buffers[1].len(),
                len,
                needed
            );
        }
    }

    if let Some(width) = kind.offset_width() {
        let data_len = match kind {
            VectorKind::VariableLength { .. } => Some(buffers[2].len()),
            _ => None,
        };
        check_offsets(field, &buffers[1], width, len, data_len)?;
    }
    Ok(())
}

fn check_offsets(
    field: &Field,
    offsets: &[u8],
    width: usize,
    len: usize,
    data_len: Option<usize>,
) -> QuiverResult<()> {
    if len == 0 {
        return Ok(());
    }
    let needed = len
        .checked_add(1)
        .and_then(|slots| slots.checked_mul(width))
        .ok_or_else(|| {
            quiver_err!(SchemaMismatch: "{} rows of {} overflow the offsets size", len, field)
        })?;
    if offsets.len() < needed {
        quiver_bail!(
            SchemaMismatch: "offsets of {} hold {} bytes, {} rows need {}",
            field,
            offsets.len(),
            len,
            needed
        );
    }
    let mut previous = 0i64;
    for index in 0..=len {
        let offset = read_offset(offsets, width, index).unwrap_or(-1);
        if offset < previous {
            quiver_bail!(
                SchemaMismatch: "offset {} of {} is {}, after {}",
                index,
                field,
                offset,
                previous
            );
        }
        previous = offset;
    }
    if let Some(data_len) = data_len {
        if usize::try_from(previous).unwrap_or(usize::MAX) > data_len {
            quiver_bail!(
                SchemaMismatch: "offsets of {} reach byte {}, the data holds {}",
                field,
                previous,
                data_len
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use quiver_dtype::{DictionaryEncoding, IntType, Nullability};
    use quiver_error::QuiverError;

    use super::*;

    fn int8_field() -> Field {
        Field::nullable("n", ArrowType::Int(IntType::INT8))
    }

    #[test]
    fn load_rejects_wrong_arity() {
        let mut vector = Vector::empty(int8_field());
        let err = vector
            .load_field_buffers(2, 0, vec![ByteBuffer::copy_from([0b11])])
            .unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
        assert_eq!(vector.len(), 0);
    }

    #[test]
    fn load_rejects_short_data() {
        let mut vector = Vector::empty(int8_field());
        let err = vector
            .load_field_buffers(
                4,
                0,
                vec![ByteBuffer::copy_from([0xff]), ByteBuffer::copy_from([1, 2])],
            )
            .unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn load_reads_values_and_nulls() {
        let mut vector = Vector::empty(int8_field());
        vector
            .load_field_buffers(
                3,
                1,
                vec![ByteBuffer::copy_from([0b101]), ByteBuffer::copy_from([7, 8, 9])],
            )
            .unwrap();
        assert_eq!(vector.value::<i8>(0), Some(7));
        assert_eq!(vector.value::<i8>(1), None);
        assert_eq!(vector.value::<i8>(2), Some(9));
        assert_eq!(vector.value::<i16>(2), None);
        assert_eq!(vector.integer_at(2), Some(9));
    }

    #[test]
    fn empty_validity_means_all_valid() {
        let mut vector = Vector::empty(int8_field());
        vector
            .load_field_buffers(2, 0, vec![ByteBuffer::empty(), ByteBuffer::copy_from([1, 2])])
            .unwrap();
        assert!(vector.is_valid(0) && vector.is_valid(1));
        assert!(vector.is_null(2));
    }

    #[test]
    fn offsets_must_be_monotonic() {
        let mut vector = Vector::empty(Field::nullable("s", ArrowType::Utf8));
        let offsets = [0i32, 3, 1]
            .iter()
            .flat_map(|o| o.to_le_bytes())
            .collect::<Vec<_>>();
        let err = vector
            .load_field_buffers(
                2,
                0,
                vec![
                    ByteBuffer::copy_from([0b11]),
                    ByteBuffer::from(offsets),
                    ByteBuffer::copy_from(b"abc"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn absence_counts_every_slot_as_null() {
        let mut vector = Vector::empty(Field::nullable("z", ArrowType::Null));
        vector.load_field_buffers(5, 0, vec![]).unwrap();
        assert_eq!(vector.null_count(), 5);
        assert!(vector.is_null(0));
        assert!(vector.validity().is_none());
    }

    #[test]
    fn struct_children_must_cover_rows() {
        let child = Vector::primitive("x", [Some(1i32)]);
        let field = Field::new_struct("s", vec![child.field().clone()], Nullability::Nullable);
        let err = Vector::try_new(field, 2, 0, vec![ByteBuffer::empty()], vec![child]).unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn dictionary_index_reads_indices() {
        let field = Field::nullable("d", ArrowType::Int(IntType::INT16))
            .with_dictionary(Some(DictionaryEncoding::new(0, false, Some(IntType::INT16))));
        let vector = Vector::try_new(
            field,
            2,
            1,
            vec![ByteBuffer::copy_from([0b01]), ByteBuffer::copy_from([3, 0, 0, 0])],
            vec![],
        )
        .unwrap();
        assert_eq!(vector.dictionary_index(0).unwrap(), Some(3));
        assert_eq!(vector.dictionary_index(1).unwrap(), None);
        assert!(Vector::primitive("p", [Some(1u8)]).dictionary_index(0).is_err());
    }

    #[test]
    fn equality_ignores_bytes_behind_nulls() {
        let a = Vector::try_new(
            int8_field(),
            2,
            1,
            vec![ByteBuffer::copy_from([0b01]), ByteBuffer::copy_from([5, 1])],
            vec![],
        )
        .unwrap();
        let b = Vector::try_new(
            int8_field(),
            2,
            1,
            vec![ByteBuffer::copy_from([0b01]), ByteBuffer::copy_from([5, 99])],
            vec![],
        )
        .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Vector::primitive("n", [Some(5i8), Some(1)]));
    }
}
