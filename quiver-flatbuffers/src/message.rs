use flatbuffers::{ForwardsUOffset, Table, Vector, VOffsetT, WIPOffset};

use crate::schema::{Buffer, KeyValue, MetadataVersion, Schema, read_i64};

flatbuffer_enum! {
    /// Tag of the header union carried by a [`Message`].
    MessageHeader: u8 {
        NONE = 0,
        Schema = 1,
        DictionaryBatch = 2,
        RecordBatch = 3,
        Tensor = 4,
        SparseTensor = 5,
    }
}

/// Length and null count of one vector in a record batch.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldNode(pub [u8; 16]);

static_assertions::assert_eq_size!(FieldNode, [u8; 16]);

impl FieldNode {
    pub fn new(length: i64, null_count: i64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&length.to_le_bytes());
        bytes[8..16].copy_from_slice(&null_count.to_le_bytes());
        Self(bytes)
    }

    pub fn length(&self) -> i64 {
        read_i64(&self.0, 0)
    }

    pub fn null_count(&self) -> i64 {
        read_i64(&self.0, 8)
    }
}

impl core::fmt::Debug for FieldNode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FieldNode")
            .field("length", &self.length())
            .field("null_count", &self.null_count())
            .finish()
    }
}

impl flatbuffers::SimpleToVerifyInSlice for FieldNode {}

impl<'a> flatbuffers::Follow<'a> for FieldNode {
    type Inner = &'a FieldNode;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        unsafe { flatbuffers::follow_cast_ref::<FieldNode>(buf, loc) }
    }
}

impl flatbuffers::Push for FieldNode {
    type Output = FieldNode;

    #[inline]
    unsafe fn push(&self, dst: &mut [u8], _written_len: usize) {
        dst.copy_from_slice(&self.0);
    }

    #[inline]
    fn alignment() -> flatbuffers::PushAlignment {
        flatbuffers::PushAlignment::new(8)
    }
}

impl flatbuffers::Verifiable for FieldNode {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.in_buffer::<Self>(pos)
    }
}

flatbuffer_table!(
    /// Field nodes and buffer locations of one batch of rows.
    RecordBatch
);

pub struct RecordBatchArgs<'a> {
    pub length: i64,
    pub nodes: Option<WIPOffset<Vector<'a, FieldNode>>>,
    pub buffers: Option<WIPOffset<Vector<'a, Buffer>>>,
}

impl<'a> RecordBatch<'a> {
    pub const VT_LENGTH: VOffsetT = 4;
    pub const VT_NODES: VOffsetT = 6;
    pub const VT_BUFFERS: VOffsetT = 8;
    pub const VT_COMPRESSION: VOffsetT = 10;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &RecordBatchArgs<'_>,
    ) -> WIPOffset<RecordBatch<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i64>(Self::VT_LENGTH, args.length, 0);
        if let Some(x) = args.buffers {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_BUFFERS, x);
        }
        if let Some(x) = args.nodes {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_NODES, x);
        }
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn length(&self) -> i64 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i64>(Self::VT_LENGTH, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn nodes(&self) -> Option<Vector<'a, FieldNode>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, FieldNode>>>(Self::VT_NODES, None)
        }
    }

    #[inline]
    pub fn buffers(&self) -> Option<Vector<'a, Buffer>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, Buffer>>>(Self::VT_BUFFERS, None)
        }
    }

    /// The body compression descriptor, when the writer compressed the body.
    #[inline]
    pub fn compression(&self) -> Option<Table<'a>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Table<'a>>>(Self::VT_COMPRESSION, None)
        }
    }
}

impl flatbuffers::Verifiable for RecordBatch<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i64>("length", Self::VT_LENGTH, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, FieldNode>>>("nodes", Self::VT_NODES, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, Buffer>>>(
                "buffers",
                Self::VT_BUFFERS,
                false,
            )?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(
    /// The values of one dictionary, or an extension of it.
    DictionaryBatch
);

pub struct DictionaryBatchArgs<'a> {
    pub id: i64,
    pub data: Option<WIPOffset<RecordBatch<'a>>>,
    pub is_delta: bool,
}

impl<'a> DictionaryBatch<'a> {
    pub const VT_ID: VOffsetT = 4;
    pub const VT_DATA: VOffsetT = 6;
    pub const VT_ISDELTA: VOffsetT = 8;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &DictionaryBatchArgs<'_>,
    ) -> WIPOffset<DictionaryBatch<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i64>(Self::VT_ID, args.id, 0);
        if let Some(x) = args.data {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_DATA, x);
        }
        fbb.push_slot::<bool>(Self::VT_ISDELTA, args.is_delta, false);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn id(&self) -> i64 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i64>(Self::VT_ID, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn data(&self) -> Option<RecordBatch<'a>> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<RecordBatch>>(Self::VT_DATA, None) }
    }

    #[inline]
    pub fn is_delta(&self) -> bool {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<bool>(Self::VT_ISDELTA, Some(false)) }.unwrap_or(false)
    }
}

impl flatbuffers::Verifiable for DictionaryBatch<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i64>("id", Self::VT_ID, false)?
            .visit_field::<ForwardsUOffset<RecordBatch>>("data", Self::VT_DATA, false)?
            .visit_field::<bool>("isDelta", Self::VT_ISDELTA, false)?
            .finish();
        Ok(())
    }
}

flatbuffer_table!(
    /// The metadata envelope of every IPC message.
    Message
);

pub struct MessageArgs<'a> {
    pub version: MetadataVersion,
    pub header_type: MessageHeader,
    pub header: Option<WIPOffset<flatbuffers::UnionWIPOffset>>,
    pub body_length: i64,
    pub custom_metadata: Option<WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>>,
}

impl<'a> Message<'a> {
    pub const VT_VERSION: VOffsetT = 4;
    pub const VT_HEADER_TYPE: VOffsetT = 6;
    pub const VT_HEADER: VOffsetT = 8;
    pub const VT_BODYLENGTH: VOffsetT = 10;
    pub const VT_CUSTOM_METADATA: VOffsetT = 12;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &MessageArgs<'_>,
    ) -> WIPOffset<Message<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<i64>(Self::VT_BODYLENGTH, args.body_length, 0);
        if let Some(x) = args.custom_metadata {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_CUSTOM_METADATA, x);
        }
        if let Some(x) = args.header {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_HEADER, x);
        }
        fbb.push_slot::<MetadataVersion>(Self::VT_VERSION, args.version, MetadataVersion::V1);
        fbb.push_slot::<MessageHeader>(Self::VT_HEADER_TYPE, args.header_type, MessageHeader::NONE);
        let o = fbb.end_table(start);
        WIPOffset::new(o.value())
    }

    #[inline]
    pub fn version(&self) -> MetadataVersion {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<MetadataVersion>(Self::VT_VERSION, Some(MetadataVersion::V1)) }
            .unwrap_or(MetadataVersion::V1)
    }

    #[inline]
    pub fn header_type(&self) -> MessageHeader {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<MessageHeader>(Self::VT_HEADER_TYPE, Some(MessageHeader::NONE)) }
            .unwrap_or(MessageHeader::NONE)
    }

    #[inline]
    pub fn header(&self) -> Option<Table<'a>> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<Table<'a>>>(Self::VT_HEADER, None) }
    }

    #[inline]
    pub fn body_length(&self) -> i64 {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<i64>(Self::VT_BODYLENGTH, Some(0)) }.unwrap_or(0)
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
    pub fn header_as_schema(&self) -> Option<Schema<'a>> {
        self.typed_header(MessageHeader::Schema)
            .map(|_tab| Schema { _tab })
    }

    #[inline]
    pub fn header_as_dictionary_batch(&self) -> Option<DictionaryBatch<'a>> {
        self.typed_header(MessageHeader::DictionaryBatch)
            .map(|_tab| DictionaryBatch { _tab })
    }

    #[inline]
    pub fn header_as_record_batch(&self) -> Option<RecordBatch<'a>> {
        self.typed_header(MessageHeader::RecordBatch)
            .map(|_tab| RecordBatch { _tab })
    }

    fn typed_header(&self, expected: MessageHeader) -> Option<Table<'a>> {
        if self.header_type() == expected {
            self.header()
        } else {
            None
        }
    }
}

impl flatbuffers::Verifiable for Message<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<MetadataVersion>("version", Self::VT_VERSION, false)?
            .visit_union::<MessageHeader, _>(
                "header_type",
                Self::VT_HEADER_TYPE,
                "header",
                Self::VT_HEADER,
                false,
                |key, v, pos| match key {
                    MessageHeader::Schema => v
                        .verify_union_variant::<ForwardsUOffset<Schema>>(
                            "MessageHeader::Schema",
                            pos,
                        ),
                    MessageHeader::DictionaryBatch => v
                        .verify_union_variant::<ForwardsUOffset<DictionaryBatch>>(
                            "MessageHeader::DictionaryBatch",
                            pos,
                        ),
                    MessageHeader::RecordBatch => v
                        .verify_union_variant::<ForwardsUOffset<RecordBatch>>(
                            "MessageHeader::RecordBatch",
                            pos,
                        ),
                    _ => Ok(()),
                },
            )?
            .visit_field::<i64>("bodyLength", Self::VT_BODYLENGTH, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<KeyValue>>>>(
                "custom_metadata",
                Self::VT_CUSTOM_METADATA,
                false,
            )?
            .finish();
        Ok(())
    }
}

/// Verifies and returns the root `Message` of `buf`.
pub fn root_as_message(buf: &[u8]) -> Result<Message<'_>, flatbuffers::InvalidFlatbuffer> {
    flatbuffers::root::<Message>(buf)
}
