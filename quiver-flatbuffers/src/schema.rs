use flatbuffers::{ForwardsUOffset, Table, Vector, VOffsetT, WIPOffset};

flatbuffer_enum! {
    /// Version of the Arrow metadata format a message was written with.
    MetadataVersion: i16 {
        V1 = 0,
        V2 = 1,
        V3 = 2,
        V4 = 3,
        V5 = 4,
    }
}

flatbuffer_enum! {
    /// Byte order of the body buffers.
    Endianness: i16 {
        Little = 0,
        Big = 1,
    }
}

flatbuffer_enum! {
    /// Width of a floating point type.
    Precision: i16 {
        HALF = 0,
        SINGLE = 1,
        DOUBLE = 2,
    }
}

flatbuffer_enum! {
    /// Unit of a date type.
    DateUnit: i16 {
        DAY = 0,
        MILLISECOND = 1,
    }
}

flatbuffer_enum! {
    /// Physical representation of a dictionary.
    DictionaryKind: i16 {
        DenseArray = 0,
    }
}

flatbuffer_enum! {
    /// Tag of the `Type` union on a field.
    Type: u8 {
        NONE = 0,
        Null = 1,
        Int = 2,
        FloatingPoint = 3,
        Binary = 4,
        Utf8 = 5,
        Bool = 6,
        Decimal = 7,
        Date = 8,
        Time = 9,
        Timestamp = 10,
        Interval = 11,
        List = 12,
        Struct_ = 13,
        Union = 14,
        FixedSizeBinary = 15,
        FixedSizeList = 16,
        Map = 17,
        Duration = 18,
        LargeBinary = 19,
        LargeUtf8 = 20,
        LargeList = 21,
    }
}

empty_table!(Null);
empty_table!(Struct_);
empty_table!(List);
empty_table!(LargeList);
empty_table!(Utf8);
empty_table!(Binary);
empty_table!(LargeUtf8);
empty_table!(LargeBinary);
empty_table!(Bool);

flatbuffer_table!(
    /// Fixed-width integer type.
    Int
);

impl<'a> Int<'a> {
    pub const VT_BITWIDTH: VOffsetT = 4;
    pub const VT_IS_SIGNED: VOffsetT = 6;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        bit_width: i32,
        is_signed: bool,
    ) -> WIPOffset<Int<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i32>(Self::VT_BITWIDTH, bit_width, 0);
        fbb.push_slot::<bool>(Self::VT_IS_SIGNED, is_signed, false);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn bit_width(&self) -> i32 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i32>(Self::VT_BITWIDTH, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<bool>(Self::VT_IS_SIGNED, Some(false)) }.unwrap_or(false)
    }
}

impl flatbuffers::Verifiable for Int<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i32>("bitWidth", Self::VT_BITWIDTH, false)?
            .visit_field::<bool>("is_signed", Self::VT_IS_SIGNED, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(FloatingPoint);

impl<'a> FloatingPoint<'a> {
    pub const VT_PRECISION: VOffsetT = 4;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        precision: Precision,
    ) -> WIPOffset<FloatingPoint<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<Precision>(Self::VT_PRECISION, precision, Precision::HALF);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<Precision>(Self::VT_PRECISION, Some(Precision::HALF)) }
            .unwrap_or(Precision::HALF)
    }
}

impl flatbuffers::Verifiable for FloatingPoint<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<Precision>("precision", Self::VT_PRECISION, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(FixedSizeBinary);

impl<'a> FixedSizeBinary<'a> {
    pub const VT_BYTEWIDTH: VOffsetT = 4;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        byte_width: i32,
    ) -> WIPOffset<FixedSizeBinary<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i32>(Self::VT_BYTEWIDTH, byte_width, 0);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn byte_width(&self) -> i32 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i32>(Self::VT_BYTEWIDTH, Some(0)) }.unwrap_or(0)
    }
}

impl flatbuffers::Verifiable for FixedSizeBinary<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i32>("byteWidth", Self::VT_BYTEWIDTH, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(FixedSizeList);

impl<'a> FixedSizeList<'a> {
    pub const VT_LISTSIZE: VOffsetT = 4;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        list_size: i32,
    ) -> WIPOffset<FixedSizeList<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i32>(Self::VT_LISTSIZE, list_size, 0);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn list_size(&self) -> i32 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i32>(Self::VT_LISTSIZE, Some(0)) }.unwrap_or(0)
    }
}

impl flatbuffers::Verifiable for FixedSizeList<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i32>("listSize", Self::VT_LISTSIZE, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(Date);

impl<'a> Date<'a> {
    pub const VT_UNIT: VOffsetT = 4;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        unit: DateUnit,
    ) -> WIPOffset<Date<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<DateUnit>(Self::VT_UNIT, unit, DateUnit::MILLISECOND);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn unit(&self) -> DateUnit {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<DateUnit>(Self::VT_UNIT, Some(DateUnit::MILLISECOND)) }
            .unwrap_or(DateUnit::MILLISECOND)
    }
}

impl flatbuffers::Verifiable for Date<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<DateUnit>("unit", Self::VT_UNIT, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(
    /// A custom metadata entry.
    KeyValue
);

impl<'a> KeyValue<'a> {
    pub const VT_KEY: VOffsetT = 4;
    pub const VT_VALUE: VOffsetT = 6;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        key: WIPOffset<&'bldr str>,
        value: WIPOffset<&'bldr str>,
    ) -> WIPOffset<KeyValue<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot_always::<WIPOffset<_>>(Self::VT_VALUE, value);
        fbb.push_slot_always::<WIPOffset<_>>(Self::VT_KEY, key);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn key(&self) -> Option<&'a str> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_KEY, None) }
    }

    #[inline]
    pub fn value(&self) -> Option<&'a str> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_VALUE, None) }
    }
}

impl flatbuffers::Verifiable for KeyValue<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("key", Self::VT_KEY, false)?
            .visit_field::<ForwardsUOffset<&str>>("value", Self::VT_VALUE, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(
    /// Marks a field as dictionary encoded.
    DictionaryEncoding
);

pub struct DictionaryEncodingArgs<'a> {
    pub id: i64,
    pub index_type: Option<WIPOffset<Int<'a>>>,
    pub is_ordered: bool,
    pub dictionary_kind: DictionaryKind,
}

impl<'a> DictionaryEncoding<'a> {
    pub const VT_ID: VOffsetT = 4;
    pub const VT_INDEXTYPE: VOffsetT = 6;
    pub const VT_ISORDERED: VOffsetT = 8;
    pub const VT_DICTIONARYKIND: VOffsetT = 10;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &DictionaryEncodingArgs<'_>,
    ) -> WIPOffset<DictionaryEncoding<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i64>(Self::VT_ID, args.id, 0);
        if let Some(index_type) = args.index_type {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_INDEXTYPE, index_type);
        }
        fbb.push_slot::<DictionaryKind>(
            Self::VT_DICTIONARYKIND,
            args.dictionary_kind,
            DictionaryKind::DenseArray,
        );
        fbb.push_slot::<bool>(Self::VT_ISORDERED, args.is_ordered, false);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn id(&self) -> i64 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i64>(Self::VT_ID, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn index_type(&self) -> Option<Int<'a>> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<Int>>(Self::VT_INDEXTYPE, None) }
    }

    #[inline]
    pub fn is_ordered(&self) -> bool {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<bool>(Self::VT_ISORDERED, Some(false)) }.unwrap_or(false)
    }

    #[inline]
    pub fn dictionary_kind(&self) -> DictionaryKind {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<DictionaryKind>(Self::VT_DICTIONARYKIND, Some(DictionaryKind::DenseArray))
        }
        .unwrap_or(DictionaryKind::DenseArray)
    }
}

impl flatbuffers::Verifiable for DictionaryEncoding<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i64>("id", Self::VT_ID, false)?
            .visit_field::<ForwardsUOffset<Int>>("indexType", Self::VT_INDEXTYPE, false)?
            .visit_field::<bool>("isOrdered", Self::VT_ISORDERED, false)?
            .visit_field::<DictionaryKind>("dictionaryKind", Self::VT_DICTIONARYKIND, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(
    /// A named, typed column, possibly with children.
    Field
);

pub struct FieldArgs<'a> {
    pub name: Option<WIPOffset<&'a str>>,
    pub nullable: bool,
    pub type_type: Type,
    pub type_: Option<WIPOffset<flatbuffers::UnionWIPOffset>>,
    pub dictionary: Option<WIPOffset<DictionaryEncoding<'a>>>,
    pub children: Option<WIPOffset<Vector<'a, ForwardsUOffset<Field<'a>>>>>,
    pub custom_metadata: Option<WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>>,
}

impl<'a> Field<'a> {
    pub const VT_NAME: VOffsetT = 4;
    pub const VT_NULLABLE: VOffsetT = 6;
    pub const VT_TYPE_TYPE: VOffsetT = 8;
    pub const VT_TYPE_: VOffsetT = 10;
    pub const VT_DICTIONARY: VOffsetT = 12;
    pub const VT_CHILDREN: VOffsetT = 14;
    pub const VT_CUSTOM_METADATA: VOffsetT = 16;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &FieldArgs<'_>,
    ) -> WIPOffset<Field<'bldr>> {
        let start = fbb.start_table();
        if let Some(x) = args.custom_metadata {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_CUSTOM_METADATA, x);
        }
        if let Some(x) = args.children {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_CHILDREN, x);
        }
        if let Some(x) = args.dictionary {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_DICTIONARY, x);
        }
        if let Some(x) = args.type_ {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_TYPE_, x);
        }
        if let Some(x) = args.name {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_NAME, x);
        }
        fbb.push_slot::<Type>(Self::VT_TYPE_TYPE, args.type_type, Type::NONE);
        fbb.push_slot::<bool>(Self::VT_NULLABLE, args.nullable, false);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }

    #[inline]
    pub fn nullable(&self) -> bool {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<bool>(Self::VT_NULLABLE, Some(false)) }.unwrap_or(false)
    }

    #[inline]
    pub fn type_type(&self) -> Type {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<Type>(Self::VT_TYPE_TYPE, Some(Type::NONE)) }
            .unwrap_or(Type::NONE)
    }

    #[inline]
    pub fn type_(&self) -> Option<Table<'a>> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<Table<'a>>>(Self::VT_TYPE_, None) }
    }

    #[inline]
    pub fn dictionary(&self) -> Option<DictionaryEncoding<'a>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<DictionaryEncoding>>(Self::VT_DICTIONARY, None)
        }
    }

    #[inline]
    pub fn children(&self) -> Option<Vector<'a, ForwardsUOffset<Field<'a>>>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Field>>>>(Self::VT_CHILDREN, None)
        }
    }

    #[inline]
    pub fn custom_metadata(&self) -> Option<Vector<'a, ForwardsUOffset<KeyValue<'a>>>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab.get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<KeyValue>>>>(
                Self::VT_CUSTOM_METADATA,
                None,
            )
        }
    }

    #[inline]
    pub fn type_as_int(&self) -> Option<Int<'a>> {
        self.typed_union(Type::Int).map(|_tab| Int { _tab })
    }

    #[inline]
    pub fn type_as_floating_point(&self) -> Option<FloatingPoint<'a>> {
        self.typed_union(Type::FloatingPoint)
            .map(|_tab| FloatingPoint { _tab })
    }

    #[inline]
    pub fn type_as_fixed_size_binary(&self) -> Option<FixedSizeBinary<'a>> {
        self.typed_union(Type::FixedSizeBinary)
            .map(|_tab| FixedSizeBinary { _tab })
    }

    #[inline]
    pub fn type_as_fixed_size_list(&self) -> Option<FixedSizeList<'a>> {
        self.typed_union(Type::FixedSizeList)
            .map(|_tab| FixedSizeList { _tab })
    }

    #[inline]
    pub fn type_as_date(&self) -> Option<Date<'a>> {
        self.typed_union(Type::Date).map(|_tab| Date { _tab })
    }

    fn typed_union(&self, expected: Type) -> Option<Table<'a>> {
        if self.type_type() == expected {
            self.type_()
        } else {
            None
        }
    }
}

impl flatbuffers::Verifiable for Field<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .visit_field::<bool>("nullable", Self::VT_NULLABLE, false)?
            .visit_union::<Type, _>(
                "type_type",
                Self::VT_TYPE_TYPE,
                "type",
                Self::VT_TYPE_,
                false,
                |key, v, pos| match key {
                    Type::Null => v.verify_union_variant::<ForwardsUOffset<Null>>("Type::Null", pos),
                    Type::Int => v.verify_union_variant::<ForwardsUOffset<Int>>("Type::Int", pos),
                    Type::FloatingPoint => v
                        .verify_union_variant::<ForwardsUOffset<FloatingPoint>>(
                            "Type::FloatingPoint",
                            pos,
                        ),
                    Type::Binary => {
                        v.verify_union_variant::<ForwardsUOffset<Binary>>("Type::Binary", pos)
                    }
                    Type::Utf8 => v.verify_union_variant::<ForwardsUOffset<Utf8>>("Type::Utf8", pos),
                    Type::Bool => v.verify_union_variant::<ForwardsUOffset<Bool>>("Type::Bool", pos),
                    Type::Date => v.verify_union_variant::<ForwardsUOffset<Date>>("Type::Date", pos),
                    Type::List => v.verify_union_variant::<ForwardsUOffset<List>>("Type::List", pos),
                    Type::Struct_ => {
                        v.verify_union_variant::<ForwardsUOffset<Struct_>>("Type::Struct_", pos)
                    }
                    Type::FixedSizeBinary => v
                        .verify_union_variant::<ForwardsUOffset<FixedSizeBinary>>(
                            "Type::FixedSizeBinary",
                            pos,
                        ),
                    Type::FixedSizeList => v
                        .verify_union_variant::<ForwardsUOffset<FixedSizeList>>(
                            "Type::FixedSizeList",
                            pos,
                        ),
                    Type::LargeBinary => v
                        .verify_union_variant::<ForwardsUOffset<LargeBinary>>(
                            "Type::LargeBinary",
                            pos,
                        ),
                    Type::LargeUtf8 => {
                        v.verify_union_variant::<ForwardsUOffset<LargeUtf8>>("Type::LargeUtf8", pos)
                    }
                    Type::LargeList => {
                        v.verify_union_variant::<ForwardsUOffset<LargeList>>("Type::LargeList", pos)
                    }
                    _ => Ok(()),
                },
            )?
            .visit_field::<ForwardsUOffset<DictionaryEncoding>>(
                "dictionary",
                Self::VT_DICTIONARY,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Field>>>>(
                "children",
                Self::VT_CHILDREN,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<KeyValue>>>>(
                "custom_metadata",
                Self::VT_CUSTOM_METADATA,
                false,
            )?
            .finish();
        Ok(())
    }
}

/// Location of a body buffer, relative to the start of the message body.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Buffer(pub [u8; 16]);

static_assertions::assert_eq_size!(Buffer, [u8; 16]);

impl Buffer {
    pub fn new(offset: i64, length: i64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&offset.to_le_bytes());
        bytes[8..16].copy_from_slice(&length.to_le_bytes());
        Self(bytes)
    }

    pub fn offset(&self) -> i64 {
        read_i64(&self.0, 0)
    }

    pub fn length(&self) -> i64 {
        read_i64(&self.0, 8)
    }
}

impl core::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Buffer")
            .field("offset", &self.offset())
            .field("length", &self.length())
            .finish()
    }
}

impl flatbuffers::SimpleToVerifyInSlice for Buffer {}

impl<'a> flatbuffers::Follow<'a> for Buffer {
    type Inner = &'a Buffer;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        unsafe { flatbuffers::follow_cast_ref::<Buffer>(buf, loc) }
    }
}

impl flatbuffers::Push for Buffer {
    type Output = Buffer;

    #[inline]
    unsafe fn push(&self, dst: &mut [u8], _written_len: usize) {
        dst.copy_from_slice(&self.0);
    }

    #[inline]
    fn alignment() -> flatbuffers::PushAlignment {
        flatbuffers::PushAlignment::new(8)
    }
}

impl flatbuffers::Verifiable for Buffer {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.in_buffer::<Self>(pos)
    }
}

pub(crate) fn read_i64(bytes: &[u8], at: usize) -> i64 {
    let mut le = [0u8; 8];
    le.copy_from_slice(&bytes[at..at + 8]);
    i64::from_le_bytes(le)
}

pub(crate) fn read_i32(bytes: &[u8], at: usize) -> i32 {
    let mut le = [0u8; 4];
    le.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(le)
}

flatbuffer_table!(
    /// The top-level schema of a stream or file.
    Schema
);

pub struct SchemaArgs<'a> {
    pub endianness: Endianness,
    pub fields: Option<WIPOffset<Vector<'a, ForwardsUOffset<Field<'a>>>>>,
    pub custom_metadata: Option<WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>>,
}

impl<'a> Schema<'a> {
    pub const VT_ENDIANNESS: VOffsetT = 4;
    pub const VT_FIELDS: VOffsetT = 6;
    pub const VT_CUSTOM_METADATA: VOffsetT = 8;
    pub const VT_FEATURES: VOffsetT = 10;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &SchemaArgs<'_>,
    ) -> WIPOffset<Schema<'bldr>> {
        let start = fbb.start_table();
        if let Some(x) = args.custom_metadata {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_CUSTOM_METADATA, x);
        }
        if let Some(x) = args.fields {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_FIELDS, x);
        }
        fbb.push_slot::<Endianness>(Self::VT_ENDIANNESS, args.endianness, Endianness::Little);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn endianness(&self) -> Endianness {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<Endianness>(Self::VT_ENDIANNESS, Some(Endianness::Little)) }
            .unwrap_or(Endianness::Little)
    }

    #[inline]
    pub fn fields(&self) -> Option<Vector<'a, ForwardsUOffset<Field<'a>>>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Field>>>>(Self::VT_FIELDS, None)
        }
    }

    #[inline]
    pub fn custom_metadata(&self) -> Option<Vector<'a, ForwardsUOffset<KeyValue<'a>>>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab.get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<KeyValue>>>>(
                Self::VT_CUSTOM_METADATA,
                None,
            )
        }
    }
}

impl flatbuffers::Verifiable for Schema<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<Endianness>("endianness", Self::VT_ENDIANNESS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Field>>>>(
                "fields",
                Self::VT_FIELDS,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<KeyValue>>>>(
                "custom_metadata",
                Self::VT_CUSTOM_METADATA,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i64>>>("features", Self::VT_FEATURES, false)?
            .finish();
        Ok(())
    }
}

/// Verifies and returns the root `Schema` of `buf`.
pub fn root_as_schema(buf: &[u8]) -> Result<Schema<'_>, flatbuffers::InvalidFlatbuffer> {
    flatbuffers::root::<Schema>(buf)
}
