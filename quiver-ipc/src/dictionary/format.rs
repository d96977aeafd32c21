//! Conversions between the memory and message forms of a schema.
//!
//! In memory a dictionary-encoded field is typed by its index integer and has no children. In a
//! message the same field is typed by the dictionary's values and carries their children, so a
//! reader can rebuild the dictionary vectors from the schema alone.

use itertools::Itertools;
use quiver_dtype::{ArrowType, Field, Schema};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_vector::Vector;

use crate::dictionary::{Dictionary, DictionaryProvider, MapDictionaryProvider};

/// The message form of `schema`, and the dictionary ids it references in pre-order.
///
/// Every dictionary-encoded field must resolve through `provider`. Converting a schema that is
/// already in message form yields the same schema.
pub fn to_message_format(
    schema: &Schema,
    provider: &dyn DictionaryProvider,
) -> QuiverResult<(Schema, Vec<i64>)> {
    let mut ids = Vec::new();
    let fields = schema
        .fields()
        .iter()
        .map(|field| message_field(field, provider, &mut ids))
        .collect::<QuiverResult<Vec<_>>>()?;
    let ids = ids.into_iter().unique().collect();
    Ok((
        Schema::new(fields).with_metadata(schema.metadata().clone()),
        ids,
    ))
}

fn message_field(
    field: &Field,
    provider: &dyn DictionaryProvider,
    ids: &mut Vec<i64>,
) -> QuiverResult<Field> {
    let Some(encoding) = field.dictionary() else {
        let children = field
            .children()
            .iter()
            .map(|child| message_field(child, provider, ids))
            .collect::<QuiverResult<Vec<_>>>()?;
        return Ok(field.clone().with_children(children));
    };

    let dictionary = provider.lookup(encoding.id()).ok_or_else(|| {
        quiver_err!(
            DictionaryResolution: "field {} references unknown dictionary {}",
            field,
            encoding.id()
        )
    })?;
    ids.push(encoding.id());
    let values = dictionary.value_field();
    Ok(field
        .clone()
        .with_data_type(values.data_type())
        .with_children(values.children()))
}

/// The memory form of `schema`, with an empty dictionary for every id it declares.
///
/// Each dictionary vector is named `DICT{id}` and takes its type and children from the field
/// that declares it. Fields sharing an id must agree on the value type.
pub fn to_memory_format(schema: &Schema) -> QuiverResult<(Schema, MapDictionaryProvider)> {
    let mut provider = MapDictionaryProvider::new();
    let fields = schema
        .fields()
        .iter()
        .map(|field| memory_field(field, &mut provider))
        .collect::<QuiverResult<Vec<_>>>()?;
    Ok((
        Schema::new(fields).with_metadata(schema.metadata().clone()),
        provider,
    ))
}

fn memory_field(field: &Field, provider: &mut MapDictionaryProvider) -> QuiverResult<Field> {
    let Some(encoding) = field.dictionary() else {
        let children = field
            .children()
            .iter()
            .map(|child| memory_field(child, provider))
            .collect::<QuiverResult<Vec<_>>>()?;
        return Ok(field.clone().with_children(children));
    };

    let values = Field::new(
        format!("DICT{}", encoding.id()),
        field.data_type(),
        field.nullability(),
    )
    .with_children(field.children());
    match provider.lookup(encoding.id()) {
        Some(existing) if existing.value_field().data_type() != values.data_type() => {
            quiver_bail!(
                DictionaryResolution: "dictionary {} is declared with values of {} and {}",
                encoding.id(),
                existing.value_field().data_type(),
                values.data_type()
            );
        }
        Some(_) => {}
        None => {
            provider.put(Dictionary::new(Vector::empty(values), *encoding));
        }
    }

    Ok(field
        .clone()
        .with_data_type(ArrowType::Int(encoding.index_type()))
        .with_children(Vec::<Field>::new()))
}

#[cfg(test)]
mod tests {
    use quiver_dtype::{DictionaryEncoding, IntType, Nullability};
    use quiver_error::QuiverError;

    use super::*;

    fn encoding(id: i64) -> DictionaryEncoding {
        DictionaryEncoding::new(id, false, Some(IntType::INT8))
    }

    fn memory_schema() -> Schema {
        Schema::new(vec![
            Field::nullable("plain", ArrowType::Bool),
            Field::nullable("coded", ArrowType::Int(IntType::INT8))
                .with_dictionary(Some(encoding(1))),
            Field::new_struct(
                "outer",
                vec![
                    Field::nullable("inner", ArrowType::Int(IntType::INT8))
                        .with_dictionary(Some(encoding(2))),
                ],
                Nullability::Nullable,
            ),
        ])
    }

    fn provider() -> MapDictionaryProvider {
        let list = Vector::try_new_list(
            "DICT2",
            &[0, 1],
            &[true],
            Vector::primitive("item", [Some(1u16)]),
        )
        .unwrap();
        [
            Dictionary::new(
                Vector::try_from_strs("DICT1", [Some("a")]).unwrap(),
                encoding(1),
            ),
            Dictionary::new(list, encoding(2)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn message_format_carries_value_types() {
        let (message, ids) = to_message_format(&memory_schema(), &provider()).unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(message.fields()[0], memory_schema().fields()[0]);
        assert_eq!(message.fields()[1].data_type(), ArrowType::Utf8);
        assert_eq!(message.fields()[1].dictionary(), Some(&encoding(1)));
        let inner = &message.fields()[2].children()[0];
        assert_eq!(inner.data_type(), ArrowType::List);
        assert_eq!(inner.children()[0].data_type(), ArrowType::Int(IntType::UINT16));

        let (again, _) = to_message_format(&message, &provider()).unwrap();
        assert_eq!(again, message);
    }

    #[test]
    fn memory_format_round_trips() {
        let (message, _) = to_message_format(&memory_schema(), &provider()).unwrap();
        let (memory, dictionaries) = to_memory_format(&message).unwrap();
        assert_eq!(memory, memory_schema());
        assert_eq!(dictionaries.ids(), vec![1, 2]);
        let dict2 = dictionaries.lookup(2).unwrap();
        assert_eq!(dict2.value_field().name(), "DICT2");
        assert_eq!(dict2.value_field().data_type(), ArrowType::List);
        assert!(dict2.vector().is_empty());
    }

    #[test]
    fn unknown_dictionary() {
        let err = to_message_format(&memory_schema(), &MapDictionaryProvider::new()).unwrap_err();
        assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
    }

    #[test]
    fn shared_id_with_different_values() {
        let schema = Schema::new(vec![
            Field::nullable("a", ArrowType::Utf8).with_dictionary(Some(encoding(3))),
            Field::nullable("b", ArrowType::Binary).with_dictionary(Some(encoding(3))),
        ]);
        let err = to_memory_format(&schema).unwrap_err();
        assert!(matches!(err, QuiverError::DictionaryResolution(..)), "{err}");
    }
}
