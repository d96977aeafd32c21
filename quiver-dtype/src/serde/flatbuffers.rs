use ::flatbuffers::{FlatBufferBuilder, Follow, ForwardsUOffset, UnionWIPOffset, Vector, WIPOffset};
use itertools::Itertools;
use quiver_error::{QuiverError, QuiverResult, quiver_bail, quiver_err};
use quiver_flatbuffers::schema as fbs;
use quiver_flatbuffers::{FlatBufferRoot, ReadFlatBuffer, WriteFlatBuffer};

use crate::{ArrowType, DateUnit, DictionaryEncoding, Field, IntType, Metadata, Precision, Schema};

impl FlatBufferRoot for Schema {}

impl WriteFlatBuffer for Schema {
    type Target<'a> = fbs::Schema<'a>;

    fn write_flatbuffer<'fb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fb>,
    ) -> WIPOffset<Self::Target<'fb>> {
        let fields = self
            .fields()
            .iter()
            .map(|field| field.write_flatbuffer(fbb))
            .collect_vec();
        let fields = fbb.create_vector(&fields);
        let custom_metadata = write_metadata(fbb, self.metadata());
        fbs::Schema::create(
            fbb,
            &fbs::SchemaArgs {
                endianness: fbs::Endianness::Little,
                fields: Some(fields),
                custom_metadata,
            },
        )
    }
}

impl ReadFlatBuffer for Schema {
    type Source<'a> = fbs::Schema<'a>;
    type Error = QuiverError;

    fn read_flatbuffer<'buf>(
        fb: &<Self::Source<'buf> as Follow<'buf>>::Inner,
    ) -> Result<Self, Self::Error> {
        if fb.endianness() != fbs::Endianness::Little {
            quiver_bail!(NotImplemented: "big-endian message bodies are not supported");
        }
        let fields: Vec<Field> = fb
            .fields()
            .unwrap_or_default()
            .iter()
            .map(|field| Field::read_flatbuffer(&field))
            .try_collect()?;
        let schema = Schema::new(fields).with_metadata(read_metadata(fb.custom_metadata())?);
        schema.validate()?;
        Ok(schema)
    }
}

impl WriteFlatBuffer for Field {
    type Target<'a> = fbs::Field<'a>;

    fn write_flatbuffer<'fb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fb>,
    ) -> WIPOffset<Self::Target<'fb>> {
        let name = fbb.create_string(self.name());
        let (type_type, type_) = write_type(fbb, self.data_type());
        let dictionary = self
            .dictionary()
            .map(|encoding| write_dictionary(fbb, encoding));
        // Other readers reject a missing children vector, so it is always written.
        let children = self
            .children()
            .iter()
            .map(|child| child.write_flatbuffer(fbb))
            .collect_vec();
        let children = fbb.create_vector(&children);
        let custom_metadata = write_metadata(fbb, self.metadata());
        fbs::Field::create(
            fbb,
            &fbs::FieldArgs {
                name: Some(name),
                nullable: self.is_nullable(),
                type_type,
                type_: Some(type_),
                dictionary,
                children: Some(children),
                custom_metadata,
            },
        )
    }
}

impl ReadFlatBuffer for Field {
    type Source<'a> = fbs::Field<'a>;
    type Error = QuiverError;

    fn read_flatbuffer<'buf>(
        fb: &<Self::Source<'buf> as Follow<'buf>>::Inner,
    ) -> Result<Self, Self::Error> {
        let data_type = read_type(fb)?;
        let children: Vec<Field> = fb
            .children()
            .unwrap_or_default()
            .iter()
            .map(|child| Field::read_flatbuffer(&child))
            .try_collect()?;
        let dictionary = fb
            .dictionary()
            .map(|encoding| read_dictionary(&encoding))
            .transpose()?;
        Ok(
            Field::new(fb.name().unwrap_or_default(), data_type, fb.nullable())
                .with_children(children)
                .with_dictionary(dictionary)
                .with_metadata(read_metadata(fb.custom_metadata())?),
        )
    }
}

/// Write custom metadata as a vector of `KeyValue` tables. Empty metadata is omitted.
pub fn write_metadata<'fb>(
    fbb: &mut FlatBufferBuilder<'fb>,
    metadata: &Metadata,
) -> Option<WIPOffset<Vector<'fb, ForwardsUOffset<fbs::KeyValue<'fb>>>>> {
    if metadata.is_empty() {
        return None;
    }
    let entries = metadata
        .iter()
        .map(|(key, value)| {
            let key = fbb.create_string(key);
            let value = fbb.create_string(value);
            fbs::KeyValue::create(fbb, key, value)
        })
        .collect_vec();
    Some(fbb.create_vector(&entries))
}

/// Read custom metadata. Entries without a value read as the empty string.
pub fn read_metadata<'a>(
    entries: Option<Vector<'a, ForwardsUOffset<fbs::KeyValue<'a>>>>,
) -> QuiverResult<Metadata> {
    entries
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let key = entry
                .key()
                .ok_or_else(|| quiver_err!(InvalidSerde: "custom metadata entry without a key"))?;
            Ok((key.to_string(), entry.value().unwrap_or_default().to_string()))
        })
        .collect()
}

fn write_type<'fb>(
    fbb: &mut FlatBufferBuilder<'fb>,
    data_type: ArrowType,
) -> (fbs::Type, WIPOffset<UnionWIPOffset>) {
    match data_type {
        ArrowType::Null => (fbs::Type::Null, fbs::Null::create(fbb).as_union_value()),
        ArrowType::Bool => (fbs::Type::Bool, fbs::Bool::create(fbb).as_union_value()),
        ArrowType::Int(int) => (
            fbs::Type::Int,
            fbs::Int::create(fbb, i32::from(int.bit_width()), int.is_signed()).as_union_value(),
        ),
        ArrowType::FloatingPoint(precision) => {
            let precision = match precision {
                Precision::Half => fbs::Precision::HALF,
                Precision::Single => fbs::Precision::SINGLE,
                Precision::Double => fbs::Precision::DOUBLE,
            };
            (
                fbs::Type::FloatingPoint,
                fbs::FloatingPoint::create(fbb, precision).as_union_value(),
            )
        }
        ArrowType::Utf8 => (fbs::Type::Utf8, fbs::Utf8::create(fbb).as_union_value()),
        ArrowType::LargeUtf8 => (
            fbs::Type::LargeUtf8,
            fbs::LargeUtf8::create(fbb).as_union_value(),
        ),
        ArrowType::Binary => (fbs::Type::Binary, fbs::Binary::create(fbb).as_union_value()),
        ArrowType::LargeBinary => (
            fbs::Type::LargeBinary,
            fbs::LargeBinary::create(fbb).as_union_value(),
        ),
        ArrowType::FixedSizeBinary(width) => (
            fbs::Type::FixedSizeBinary,
            fbs::FixedSizeBinary::create(fbb, width).as_union_value(),
        ),
        ArrowType::Date(unit) => {
            let unit = match unit {
                DateUnit::Day => fbs::DateUnit::DAY,
                DateUnit::Millisecond => fbs::DateUnit::MILLISECOND,
            };
            (fbs::Type::Date, fbs::Date::create(fbb, unit).as_union_value())
        }
        ArrowType::List => (fbs::Type::List, fbs::List::create(fbb).as_union_value()),
        ArrowType::LargeList => (
            fbs::Type::LargeList,
            fbs::LargeList::create(fbb).as_union_value(),
        ),
        ArrowType::FixedSizeList(size) => (
            fbs::Type::FixedSizeList,
            fbs::FixedSizeList::create(fbb, size).as_union_value(),
        ),
        ArrowType::Struct => (fbs::Type::Struct_, fbs::Struct_::create(fbb).as_union_value()),
    }
}

fn read_type(fb: &fbs::Field<'_>) -> QuiverResult<ArrowType> {
    let type_type = fb.type_type();
    let missing = || {
        quiver_err!(
            InvalidSerde: "field {} has type {} but no type table",
            fb.name().unwrap_or_default(),
            type_name(type_type)
        )
    };
    Ok(match type_type {
        fbs::Type::Null => ArrowType::Null,
        fbs::Type::Bool => ArrowType::Bool,
        fbs::Type::Int => ArrowType::Int(read_int(&fb.type_as_int().ok_or_else(missing)?)?),
        fbs::Type::FloatingPoint => {
            let precision = fb.type_as_floating_point().ok_or_else(missing)?.precision();
            ArrowType::FloatingPoint(match precision {
                fbs::Precision::HALF => Precision::Half,
                fbs::Precision::SINGLE => Precision::Single,
                fbs::Precision::DOUBLE => Precision::Double,
                other => quiver_bail!(InvalidSerde: "unknown floating point precision {}", other.0),
            })
        }
        fbs::Type::Utf8 => ArrowType::Utf8,
        fbs::Type::LargeUtf8 => ArrowType::LargeUtf8,
        fbs::Type::Binary => ArrowType::Binary,
        fbs::Type::LargeBinary => ArrowType::LargeBinary,
        fbs::Type::FixedSizeBinary => {
            let width = fb.type_as_fixed_size_binary().ok_or_else(missing)?.byte_width();
            if width < 0 {
                quiver_bail!(InvalidSerde: "negative fixed size binary width {}", width);
            }
            ArrowType::FixedSizeBinary(width)
        }
        fbs::Type::Date => ArrowType::Date(match fb.type_as_date().ok_or_else(missing)?.unit() {
            fbs::DateUnit::DAY => DateUnit::Day,
            fbs::DateUnit::MILLISECOND => DateUnit::Millisecond,
            other => quiver_bail!(InvalidSerde: "unknown date unit {}", other.0),
        }),
        fbs::Type::List => ArrowType::List,
        fbs::Type::LargeList => ArrowType::LargeList,
        fbs::Type::FixedSizeList => {
            let size = fb.type_as_fixed_size_list().ok_or_else(missing)?.list_size();
            if size < 0 {
                quiver_bail!(InvalidSerde: "negative fixed size list size {}", size);
            }
            ArrowType::FixedSizeList(size)
        }
        fbs::Type::Struct_ => ArrowType::Struct,
        other => quiver_bail!(NotImplemented: "Arrow type {} is not supported", type_name(other)),
    })
}

fn read_int(int: &fbs::Int<'_>) -> QuiverResult<IntType> {
    let bit_width = match int.bit_width() {
        8 => 8,
        16 => 16,
        32 => 32,
        64 => 64,
        other => quiver_bail!(InvalidSerde: "unsupported integer bit width {}", other),
    };
    Ok(IntType::new(bit_width, int.is_signed()))
}

fn write_dictionary<'fb>(
    fbb: &mut FlatBufferBuilder<'fb>,
    encoding: &DictionaryEncoding,
) -> WIPOffset<fbs::DictionaryEncoding<'fb>> {
    let index_type = encoding.index_type();
    let index_type = fbs::Int::create(
        fbb,
        i32::from(index_type.bit_width()),
        index_type.is_signed(),
    );
    fbs::DictionaryEncoding::create(
        fbb,
        &fbs::DictionaryEncodingArgs {
            id: encoding.id(),
            index_type: Some(index_type),
            is_ordered: encoding.is_ordered(),
            dictionary_kind: fbs::DictionaryKind::DenseArray,
        },
    )
}

fn read_dictionary(fb: &fbs::DictionaryEncoding<'_>) -> QuiverResult<DictionaryEncoding> {
    if fb.dictionary_kind() != fbs::DictionaryKind::DenseArray {
        quiver_bail!(
            NotImplemented: "dictionary kind {} is not supported",
            fb.dictionary_kind().0
        );
    }
    let index_type = fb
        .index_type()
        .map(|int| read_int(&int))
        .transpose()?;
    Ok(DictionaryEncoding::new(fb.id(), fb.is_ordered(), index_type))
}

fn type_name(type_type: fbs::Type) -> String {
    type_type
        .variant_name()
        .map_or_else(|| format!("<tag {}>", type_type.0), str::to_string)
}

#[cfg(test)]
mod tests {
    use ::flatbuffers::FlatBufferBuilder;
    use quiver_error::QuiverError;
    use quiver_flatbuffers::WriteFlatBufferExt;
    use rstest::rstest;

    use super::*;

    fn round_trip(schema: &Schema) -> Schema {
        let bytes = schema.write_flatbuffer_bytes();
        Schema::read_flatbuffer_bytes(&bytes).unwrap()
    }

    #[rstest]
    #[case(ArrowType::Null)]
    #[case(ArrowType::Bool)]
    #[case(ArrowType::Int(IntType::INT8))]
    #[case(ArrowType::Int(IntType::UINT64))]
    #[case(ArrowType::FloatingPoint(Precision::Half))]
    #[case(ArrowType::FloatingPoint(Precision::Double))]
    #[case(ArrowType::Utf8)]
    #[case(ArrowType::LargeUtf8)]
    #[case(ArrowType::Binary)]
    #[case(ArrowType::LargeBinary)]
    #[case(ArrowType::FixedSizeBinary(12))]
    #[case(ArrowType::Date(DateUnit::Day))]
    #[case(ArrowType::Date(DateUnit::Millisecond))]
    fn leaf_types(#[case] data_type: ArrowType) {
        let schema = Schema::new(vec![Field::nullable("f", data_type)]);
        assert_eq!(round_trip(&schema), schema);
    }

    #[test]
    fn nested_fields_with_metadata_and_dictionaries() {
        let mut metadata = Metadata::new();
        metadata.insert("origin".to_string(), "sensor-7".to_string());
        let schema = Schema::new(vec![
            Field::new_struct(
                "point",
                vec![
                    Field::non_nullable("x", ArrowType::FloatingPoint(Precision::Single)),
                    Field::nullable("label", ArrowType::Int(IntType::INT16)).with_dictionary(Some(
                        DictionaryEncoding::new(4, true, Some(IntType::INT16)),
                    )),
                ],
                true,
            )
            .with_metadata(metadata.clone()),
            Field::new(
                "fixed",
                ArrowType::FixedSizeList(3),
                false,
            )
            .with_children(vec![Field::nullable("", ArrowType::Int(IntType::UINT8))]),
            Field::new_list("tags", Field::nullable("item", ArrowType::LargeUtf8), true),
        ])
        .with_metadata(metadata);

        let read = round_trip(&schema);
        assert_eq!(read, schema);
        assert_eq!(read.dictionary_encodings()[0].index_type(), IntType::INT16);
    }

    #[test]
    fn missing_index_type_defaults_to_int32() {
        let mut fbb = FlatBufferBuilder::new();
        let dictionary = fbs::DictionaryEncoding::create(
            &mut fbb,
            &fbs::DictionaryEncodingArgs {
                id: 9,
                index_type: None,
                is_ordered: false,
                dictionary_kind: fbs::DictionaryKind::DenseArray,
            },
        );
        let utf8 = fbs::Utf8::create(&mut fbb).as_union_value();
        let field = fbs::Field::create(
            &mut fbb,
            &fbs::FieldArgs {
                name: None,
                nullable: true,
                type_type: fbs::Type::Utf8,
                type_: Some(utf8),
                dictionary: Some(dictionary),
                children: None,
                custom_metadata: None,
            },
        );
        fbb.finish_minimal(field);

        let field = Field::read_flatbuffer_bytes(fbb.finished_data()).unwrap();
        assert_eq!(field.name(), "");
        assert_eq!(
            field.dictionary(),
            Some(&DictionaryEncoding::new(9, false, Some(IntType::INT32)))
        );
    }

    #[test]
    fn unsupported_types_are_not_implemented() {
        let mut fbb = FlatBufferBuilder::new();
        let table = fbs::Null::create(&mut fbb).as_union_value();
        let name = fbb.create_string("amount");
        let field = fbs::Field::create(
            &mut fbb,
            &fbs::FieldArgs {
                name: Some(name),
                nullable: true,
                type_type: fbs::Type::Decimal,
                type_: Some(table),
                dictionary: None,
                children: None,
                custom_metadata: None,
            },
        );
        fbb.finish_minimal(field);

        let err = Field::read_flatbuffer_bytes(fbb.finished_data()).unwrap_err();
        assert!(matches!(err, QuiverError::NotImplemented(..)), "{err}");
    }
}
