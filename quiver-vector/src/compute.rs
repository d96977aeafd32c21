//! Copying kernels: gathering slots from one or more vectors into a new one.

use quiver_buffer::{BitmapBuilder, ByteBuffer, get_bit};
use quiver_dtype::{ArrowType, Field};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};

use crate::vector::same_layout;
use crate::{Vector, VectorKind};

/// A slot of one of the source vectors, or `None` for a null slot.
type Pick = Option<(usize, usize)>;

impl Vector {
    /// A new vector holding the slots at `indices`; `None` produces a null slot.
    pub fn take(&self, indices: &[Option<usize>]) -> QuiverResult<Vector> {
        if let Some(&index) = indices.iter().flatten().find(|&&index| index >= self.len()) {
            quiver_bail!(OutOfBounds: index, 0, self.len());
        }
        let picks: Vec<Pick> = indices.iter().map(|index| index.map(|i| (0, i))).collect();
        gather(self.field(), &[self], &picks)
    }

    /// A new vector holding the slots of `self` followed by those of `other`.
    ///
    /// Both vectors must share a layout; the result carries the field of `self`.
    pub fn append(&self, other: &Vector) -> QuiverResult<Vector> {
        if !same_layout(self.field(), other.field()) {
            quiver_bail!(
                SchemaMismatch: "cannot append {} to {}",
                other.field(),
                self.field()
            );
        }
        let picks: Vec<Pick> = (0..self.len())
            .map(|i| Some((0, i)))
            .chain((0..other.len()).map(|i| Some((1, i))))
            .collect();
        gather(self.field(), &[self, other], &picks)
    }
}

fn gather(field: &Field, sources: &[&Vector], picks: &[Pick]) -> QuiverResult<Vector> {
    let kind = VectorKind::of(field);
    let len = picks.len();
    if kind == VectorKind::Absence {
        return Ok(Vector::new_unchecked(field.clone(), len, len, vec![], vec![]));
    }

    let mut validity = BitmapBuilder::with_capacity(len);
    for pick in picks {
        validity.append(pick.is_some_and(|(source, index)| sources[source].is_valid(index)));
    }
    let null_count = validity.unset_count();
    let mut buffers = vec![validity.finish()];
    let mut children = Vec::new();

    match kind {
        VectorKind::Absence => {}
        VectorKind::FixedWidth { bit_width: 1 } => {
            let mut bits = BitmapBuilder::with_capacity(len);
            for pick in picks {
                bits.append(pick.is_some_and(|(source, index)| {
                    sources[source]
                        .data()
                        .is_some_and(|data| get_bit(data, index))
                }));
            }
            buffers.push(bits.finish());
        }
        VectorKind::FixedWidth { .. } | VectorKind::DictionaryIndex { .. } => {
            let byte_width = kind.bit_width().unwrap_or_default() / 8;
            let mut data = Vec::with_capacity(len * byte_width);
            for pick in picks {
                match pick.and_then(|(source, index)| sources[source].fixed_slot(index, byte_width))
                {
                    Some(bytes) => data.extend_from_slice(bytes),
                    None => data.resize(data.len() + byte_width, 0),
                }
            }
            buffers.push(ByteBuffer::from(data));
        }
        VectorKind::VariableLength { offset_width } => {
            let mut offsets = Vec::with_capacity((len + 1) * offset_width);
            let mut data = Vec::new();
            push_offset(&mut offsets, offset_width, 0)?;
            for pick in picks {
                if let Some(bytes) =
                    pick.and_then(|(source, index)| sources[source].raw_bytes(index))
                {
                    data.extend_from_slice(bytes);
                }
                push_offset(&mut offsets, offset_width, data.len())?;
            }
            buffers.push(ByteBuffer::from(offsets));
            buffers.push(ByteBuffer::from(data));
        }
        VectorKind::Nested { offset_width } => match (offset_width, field.data_type()) {
            (Some(offset_width), _) => {
                let mut offsets = Vec::with_capacity((len + 1) * offset_width);
                let mut child_picks = Vec::new();
                push_offset(&mut offsets, offset_width, 0)?;
                for pick in picks {
                    if let Some((source, index)) = *pick {
                        let range = sources[source].list_range(index).unwrap_or_default();
                        child_picks.extend(range.map(|i| Some((source, i))));
                    }
                    push_offset(&mut offsets, offset_width, child_picks.len())?;
                }
                buffers.push(ByteBuffer::from(offsets));
                children.push(gather(
                    &field.children()[0],
                    &child_sources(sources, 0),
                    &child_picks,
                )?);
            }
            (None, ArrowType::FixedSizeList(size)) => {
                let size =
                    usize::try_from(size).map_err(|_| quiver_err!("negative list size {}", size))?;
                let mut child_picks = Vec::with_capacity(len * size);
                for pick in picks {
                    match *pick {
                        Some((source, index)) => child_picks
                            .extend((index * size..(index + 1) * size).map(|i| Some((source, i)))),
                        None => child_picks.extend(std::iter::repeat_n(None, size)),
                    }
                }
                children.push(gather(
                    &field.children()[0],
                    &child_sources(sources, 0),
                    &child_picks,
                )?);
            }
            _ => {
                for (k, child_field) in field.children().iter().enumerate() {
                    children.push(gather(child_field, &child_sources(sources, k), picks)?);
                }
            }
        },
    }

    Ok(Vector::new_unchecked(
        field.clone(),
        len,
        null_count,
        buffers,
        children,
    ))
}

fn push_offset(offsets: &mut Vec<u8>, width: usize, offset: usize) -> QuiverResult<()> {
    if width == 4 {
        let offset = i32::try_from(offset)
            .map_err(|_| quiver_err!("offset {} does not fit 32 bits", offset))?;
        offsets.extend_from_slice(&offset.to_le_bytes());
    } else {
        let offset = i64::try_from(offset)
            .map_err(|_| quiver_err!("offset {} does not fit 64 bits", offset))?;
        offsets.extend_from_slice(&offset.to_le_bytes());
    }
    Ok(())
}

fn child_sources<'a>(sources: &[&'a Vector], k: usize) -> Vec<&'a Vector> {
    sources.iter().map(|&source| &source.children()[k]).collect()
}

#[cfg(test)]
mod tests {
    use quiver_dtype::IntType;
    use quiver_error::QuiverError;

    use super::*;

    #[test]
    fn take_primitives() {
        let vector = Vector::primitive("n", [Some(10i32), None, Some(30)]);
        let taken = vector.take(&[Some(2), None, Some(1), Some(0)]).unwrap();
        assert_eq!(taken.len(), 4);
        assert_eq!(taken.null_count(), 2);
        assert_eq!(taken.value::<i32>(0), Some(30));
        assert_eq!(taken.value::<i32>(1), None);
        assert_eq!(taken.value::<i32>(2), None);
        assert_eq!(taken.value::<i32>(3), Some(10));
    }

    #[test]
    fn take_out_of_bounds() {
        let vector = Vector::primitive("n", [Some(1u8)]);
        let err = vector.take(&[Some(1)]).unwrap_err();
        assert!(matches!(err, QuiverError::OutOfBounds(1, 0, 1, _)), "{err}");
    }

    #[test]
    fn take_strings_and_bools() {
        let strings = Vector::try_from_strs("s", [Some("a"), Some("bc"), None]).unwrap();
        let taken = strings.take(&[Some(1), Some(2), Some(1)]).unwrap();
        assert_eq!(taken.str_value(0), Some("bc"));
        assert_eq!(taken.str_value(1), None);
        assert_eq!(taken.str_value(2), Some("bc"));

        let bools = Vector::bools("b", [Some(true), Some(false)]);
        let taken = bools.take(&[Some(1), Some(0), None]).unwrap();
        assert_eq!(taken.bool_value(0), Some(false));
        assert_eq!(taken.bool_value(1), Some(true));
        assert_eq!(taken.bool_value(2), None);
    }

    #[test]
    fn take_lists() {
        let items = Vector::primitive("item", [Some(1u8), Some(2), Some(3)]);
        let list = Vector::try_new_list("l", &[0, 2, 3], &[true, true], items).unwrap();
        let taken = list.take(&[Some(1), None, Some(0)]).unwrap();
        taken.validate().unwrap();
        assert_eq!(taken.list_range(0), Some(0..1));
        assert_eq!(taken.list_range(1), Some(1..1));
        assert_eq!(taken.list_range(2), Some(1..3));
        assert_eq!(taken.children()[0].value::<u8>(0), Some(3));
        assert_eq!(taken.children()[0].value::<u8>(2), Some(2));
    }

    #[test]
    fn append_concatenates() {
        let a = Vector::try_from_strs("s", [Some("x"), None]).unwrap();
        let b = Vector::try_from_strs("other", [Some("yz")]).unwrap();
        let joined = a.append(&b).unwrap();
        assert_eq!(joined.name(), "s");
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.null_count(), 1);
        assert_eq!(joined.str_value(2), Some("yz"));
        assert_eq!(
            joined,
            Vector::try_from_strs("s", [Some("x"), None, Some("yz")]).unwrap()
        );
    }

    #[test]
    fn append_requires_same_layout() {
        let a = Vector::primitive("n", [Some(1i32)]);
        let b = Vector::primitive("n", [Some(1i64)]);
        assert!(a.append(&b).is_err());
        let c = Vector::primitive("n", [Some(2i32)]);
        let joined = a.append(&c).unwrap();
        assert_eq!(joined.field().data_type(), ArrowType::Int(IntType::INT32));
    }

    #[test]
    fn append_structs() {
        let a = Vector::try_new_struct("s", vec![Vector::primitive("x", [Some(1u16)])]).unwrap();
        let b = Vector::try_new_struct("s", vec![Vector::primitive("x", [Some(2u16)])]).unwrap();
        let joined = a.append(&b).unwrap();
        joined.validate().unwrap();
        assert_eq!(joined.children()[0].value::<u16>(1), Some(2));
    }
}
