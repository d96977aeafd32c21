//! Constructors for vectors built from Rust values.

use itertools::Itertools;
use quiver_buffer::{BitmapBuilder, ByteBuffer};
use quiver_dtype::{ArrowType, Field, FieldName, Nullability};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};

use crate::native::write_integer;
use crate::{NativeType, Vector, VectorKind};

impl Vector {
    /// A nullable vector of primitives.
    pub fn primitive<T: NativeType>(
        name: impl Into<FieldName>,
        values: impl IntoIterator<Item = Option<T>>,
    ) -> Self {
        let values = values.into_iter();
        let mut validity = BitmapBuilder::with_capacity(values.size_hint().0);
        let mut data = Vec::with_capacity(values.size_hint().0 * size_of::<T>());
        for value in values {
            validity.append(value.is_some());
            value.unwrap_or_default().extend_le(&mut data);
        }
        let len = validity.len();
        let null_count = validity.unset_count();
        Self::new_unchecked(
            Field::nullable(name, T::ARROW_TYPE),
            len,
            null_count,
            vec![validity.finish(), ByteBuffer::from(data)],
            vec![],
        )
    }

    /// A nullable vector of booleans.
    pub fn bools(
        name: impl Into<FieldName>,
        values: impl IntoIterator<Item = Option<bool>>,
    ) -> Self {
        let mut validity = BitmapBuilder::default();
        let mut data = BitmapBuilder::default();
        for value in values {
            validity.append(value.is_some());
            data.append(value.unwrap_or_default());
        }
        let len = validity.len();
        let null_count = validity.unset_count();
        Self::new_unchecked(
            Field::nullable(name, ArrowType::Bool),
            len,
            null_count,
            vec![validity.finish(), data.finish()],
            vec![],
        )
    }

    /// A vector of the null type, `len` slots long.
    pub fn nulls(name: impl Into<FieldName>, len: usize) -> Self {
        Self::new_unchecked(Field::nullable(name, ArrowType::Null), len, len, vec![], vec![])
    }

    /// A nullable `utf8` vector.
    pub fn try_from_strs<S: AsRef<str>>(
        name: impl Into<FieldName>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> QuiverResult<Self> {
        Self::try_from_variable_length(
            Field::nullable(name, ArrowType::Utf8),
            values
                .into_iter()
                .map(|value| value.map(|s| s.as_ref().as_bytes().to_vec())),
        )
    }

    /// A nullable `binary` vector.
    pub fn try_from_binary<B: AsRef<[u8]>>(
        name: impl Into<FieldName>,
        values: impl IntoIterator<Item = Option<B>>,
    ) -> QuiverResult<Self> {
        Self::try_from_variable_length(
            Field::nullable(name, ArrowType::Binary),
            values
                .into_iter()
                .map(|value| value.map(|b| b.as_ref().to_vec())),
        )
    }

    fn try_from_variable_length(
        field: Field,
        values: impl Iterator<Item = Option<Vec<u8>>>,
    ) -> QuiverResult<Self> {
        let mut validity = BitmapBuilder::default();
        let mut offsets = Vec::new();
        let mut data = Vec::new();
        0i32.extend_le(&mut offsets);
        for value in values {
            validity.append(value.is_some());
            data.extend_from_slice(&value.unwrap_or_default());
            i32::try_from(data.len())
                .map_err(|_| quiver_err!("{} bytes do not fit 32-bit offsets", data.len()))?
                .extend_le(&mut offsets);
        }
        let len = validity.len();
        let null_count = validity.unset_count();
        Ok(Self::new_unchecked(
            field,
            len,
            null_count,
            vec![
                validity.finish(),
                ByteBuffer::from(offsets),
                ByteBuffer::from(data),
            ],
            vec![],
        ))
    }

    /// A nullable struct vector over `children`, which must all have the same length. Every
    /// struct slot is valid.
    pub fn try_new_struct(name: impl Into<FieldName>, children: Vec<Vector>) -> QuiverResult<Self> {
        let len = match children.iter().map(Vector::len).all_equal_value() {
            Ok(len) => len,
            Err(None) => 0,
            Err(Some(_)) => quiver_bail!(
                "struct children have differing lengths [{}]",
                children.iter().map(Vector::len).join(", ")
            ),
        };
        let field = Field::new_struct(
            name,
            children.iter().map(|child| child.field().clone()).collect_vec(),
            Nullability::Nullable,
        );
        let mut validity = BitmapBuilder::with_capacity(len);
        (0..len).for_each(|_| validity.append(true));
        Vector::try_new(field, len, 0, vec![validity.finish()], children)
    }

    /// A vector of dictionary indices for the dictionary-encoded `field`.
    pub fn try_new_indices(field: Field, indices: &[Option<usize>]) -> QuiverResult<Self> {
        let VectorKind::DictionaryIndex { index_type } = VectorKind::of(&field) else {
            quiver_bail!("field {} is not dictionary encoded", field);
        };
        let mut validity = BitmapBuilder::with_capacity(indices.len());
        let mut data = Vec::with_capacity(indices.len() * index_type.byte_width());
        for index in indices {
            validity.append(index.is_some());
            let value = i128::try_from(index.unwrap_or_default()).unwrap_or(i128::MAX);
            write_integer(value, index_type, &mut data).ok_or_else(|| {
                quiver_err!(
                    DictionaryResolution: "index {} does not fit {}",
                    value,
                    index_type
                )
            })?;
        }
        let null_count = validity.unset_count();
        Ok(Self::new_unchecked(
            field,
            indices.len(),
            null_count,
            vec![validity.finish(), ByteBuffer::from(data)],
            vec![],
        ))
    }

    /// A nullable list vector. `offsets` holds one more entry than there are lists and `valid`
    /// one entry per list.
    pub fn try_new_list(
        name: impl Into<FieldName>,
        offsets: &[i32],
        valid: &[bool],
        values: Vector,
    ) -> QuiverResult<Self> {
        if offsets.len() != valid.len() + 1 {
            quiver_bail!(
                "{} offsets cannot describe {} lists",
                offsets.len(),
                valid.len()
            );
        }
        let mut validity = BitmapBuilder::with_capacity(valid.len());
        valid.iter().for_each(|bit| validity.append(*bit));
        let null_count = validity.unset_count();
        let mut offset_bytes = Vec::with_capacity(offsets.len() * 4);
        offsets
            .iter()
            .for_each(|offset| offset.extend_le(&mut offset_bytes));
        let field = Field::new_list(name, values.field().clone(), Nullability::Nullable);
        Vector::try_new(
            field,
            valid.len(),
            null_count,
            vec![validity.finish(), ByteBuffer::from(offset_bytes)],
            vec![values],
        )
    }
}
