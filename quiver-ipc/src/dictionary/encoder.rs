use std::hash::{BuildHasher, Hasher};

use hashbrown::HashMap;
use quiver_dtype::{ArrowType, DictionaryEncoding, Field};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_vector::Vector;

use crate::dictionary::Dictionary;

/// Converts between plain vectors and vectors of dictionary indices.
#[derive(Debug)]
pub struct DictionaryEncoder<'a> {
    dictionary: &'a Dictionary,
    slots: HashMap<u64, Vec<usize>>,
}

impl<'a> DictionaryEncoder<'a> {
    /// Index the values of `dictionary` for encoding.
    pub fn new(dictionary: &'a Dictionary) -> Self {
        let values = dictionary.vector();
        let mut slots: HashMap<u64, Vec<usize>> = HashMap::with_capacity(values.len());
        for index in 0..values.len() {
            let hash = hash_slot(slots.hasher(), values, index);
            slots.entry(hash).or_default().push(index);
        }
        Self { dictionary, slots }
    }

    /// Replace every value of `vector` with the index of the first equal dictionary value.
    ///
    /// Nulls become null indices. The result keeps the name, nullability and metadata of
    /// `vector` and is typed by the dictionary's index type.
    pub fn encode(&self, vector: &Vector) -> QuiverResult<Vector> {
        let values = self.dictionary.vector();
        if vector.field().dictionary().is_some() {
            quiver_bail!("vector {} is already dictionary encoded", vector.field());
        }
        if vector.field().data_type() != values.field().data_type() {
            quiver_bail!(
                SchemaMismatch: "cannot encode {} with dictionary of {} values",
                vector.field(),
                values.field().data_type()
            );
        }

        let indices = (0..vector.len())
            .map(|slot| {
                if vector.is_null(slot) {
                    return Ok(None);
                }
                self.slots
                    .get(&hash_slot(self.slots.hasher(), vector, slot))
                    .and_then(|candidates| {
                        candidates
                            .iter()
                            .copied()
                            .find(|&index| vector.value_eq(slot, values, index))
                    })
                    .map(Some)
                    .ok_or_else(|| {
                        quiver_err!(
                            DictionaryResolution: "slot {} of {} is not in dictionary {}",
                            slot,
                            vector.field(),
                            self.dictionary.id()
                        )
                    })
            })
            .collect::<QuiverResult<Vec<_>>>()?;

        Vector::try_new_indices(
            index_field(vector.field(), self.dictionary.encoding()),
            &indices,
        )
    }

    /// Replace every index of `indices` with the dictionary value it points at.
    pub fn decode(&self, indices: &Vector) -> QuiverResult<Vector> {
        decode(indices, self.dictionary)
    }
}

/// Resolve dictionary indices against `dictionary`.
///
/// The result is a plain vector with the name, nullability and metadata of `indices` and the
/// type of the dictionary values.
pub fn decode(indices: &Vector, dictionary: &Dictionary) -> QuiverResult<Vector> {
    let Some(encoding) = indices.field().dictionary() else {
        quiver_bail!("vector {} is not dictionary encoded", indices.field());
    };
    if encoding.id() != dictionary.id() {
        quiver_bail!(
            DictionaryResolution: "vector {} indexes dictionary {}, not {}",
            indices.field(),
            encoding.id(),
            dictionary.id()
        );
    }
    let values = dictionary.vector();
    let positions = (0..indices.len())
        .map(|slot| {
            let index = indices.dictionary_index(slot)?;
            if let Some(index) = index.filter(|&index| index >= values.len()) {
                quiver_bail!(
                    DictionaryResolution: "index {} at slot {} of {} is past the {} values of dictionary {}",
                    index,
                    slot,
                    indices.field(),
                    values.len(),
                    dictionary.id()
                );
            }
            Ok(index)
        })
        .collect::<QuiverResult<Vec<_>>>()?;

    let field = Field::new(
        indices.name(),
        values.field().data_type(),
        indices.field().nullability(),
    )
    .with_children(values.field().children())
    .with_metadata(indices.field().metadata().clone());
    values.take(&positions)?.with_field(field)
}

/// The field of the index vector that dictionary-encodes `field`.
fn index_field(field: &Field, encoding: &DictionaryEncoding) -> Field {
    field
        .clone()
        .with_data_type(ArrowType::Int(encoding.index_type()))
        .with_children(Vec::<Field>::new())
        .with_dictionary(Some(*encoding))
}

fn hash_slot(hasher: &impl BuildHasher, vector: &Vector, index: usize) -> u64 {
    let mut state = hasher.build_hasher();
    vector.hash_value(index, &mut state);
    state.finish()
}

#[cfg(test)]
mod tests {
    use quiver_dtype::IntType;
    use quiver_error::QuiverError;
    use rstest::rstest;

    use super::*;

    fn strings() -> Dictionary {
        Dictionary::new(
            Vector::try_from_strs("DICT1", [Some("foo"), Some("bar"), Some("baz")]).unwrap(),
            DictionaryEncoding::new(1, false, Some(IntType::INT16)),
        )
    }

    #[test]
    fn encode_then_decode() {
        let dictionary = strings();
        let encoder = DictionaryEncoder::new(&dictionary);
        let vector =
            Vector::try_from_strs("v", [Some("baz"), None, Some("foo"), Some("baz")]).unwrap();

        let indices = encoder.encode(&vector).unwrap();
        assert_eq!(indices.field().data_type(), ArrowType::Int(IntType::INT16));
        assert_eq!(indices.field().dictionary().map(|d| d.id()), Some(1));
        assert_eq!(
            (0..4)
                .map(|i| indices.dictionary_index(i).unwrap())
                .collect::<Vec<_>>(),
            vec![Some(2), None, Some(0), Some(2)]
        );
        assert_eq!(indices.null_count(), 1);

        assert_eq!(encoder.decode(&indices).unwrap(), vector);
    }

    #[test]
    fn missing_value_is_rejected() {
        let dictionary = strings();
        let vector = Vector::try_from_strs("v", [Some("foo"), Some("qux")]).unwrap();
        let err = DictionaryEncoder::new(&dictionary)
            .encode(&vector)
            .unwrap_err();
        assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let dictionary = strings();
        let vector = Vector::primitive("v", [Some(1i32)]);
        let err = DictionaryEncoder::new(&dictionary)
            .encode(&vector)
            .unwrap_err();
        assert!(matches!(err, QuiverError::SchemaMismatch(..)), "{err}");
    }

    #[test]
    fn duplicate_values_resolve_to_first() {
        let dictionary = Dictionary::new(
            Vector::primitive("DICT4", [Some(7i64), Some(7), Some(9)]),
            DictionaryEncoding::new(4, false, None),
        );
        let indices = DictionaryEncoder::new(&dictionary)
            .encode(&Vector::primitive("v", [Some(9i64), Some(7)]))
            .unwrap();
        assert_eq!(indices.dictionary_index(0).unwrap(), Some(2));
        assert_eq!(indices.dictionary_index(1).unwrap(), Some(0));
    }

    #[rstest]
    #[case::past_the_end(3, true)]
    #[case::last(2, false)]
    fn decode_checks_bounds(#[case] index: usize, #[case] fails: bool) {
        let dictionary = strings();
        let field = index_field(&Field::nullable("v", ArrowType::Utf8), dictionary.encoding());
        let indices = Vector::try_new_indices(field, &[Some(index)]).unwrap();
        let result = decode(&indices, &dictionary);
        assert_eq!(result.is_err(), fails);
        if let Err(err) = result {
            assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
        }
    }

    #[test]
    fn decode_checks_the_id() {
        let dictionary = strings();
        let other = DictionaryEncoding::new(2, false, Some(IntType::INT16));
        let field = index_field(&Field::nullable("v", ArrowType::Utf8), &other);
        let indices = Vector::try_new_indices(field, &[Some(0)]).unwrap();
        assert!(decode(&indices, &dictionary).is_err());
    }
}
