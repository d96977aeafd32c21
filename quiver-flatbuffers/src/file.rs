use flatbuffers::{ForwardsUOffset, Vector, VOffsetT, WIPOffset};

use crate::schema::{KeyValue, MetadataVersion, Schema, read_i32, read_i64};

/// Position of one message inside a file. Laid out as `i64, i32, <4 bytes padding>, i64`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Block(pub [u8; 24]);

static_assertions::assert_eq_size!(Block, [u8; 24]);

impl Block {
    pub fn new(offset: i64, meta_data_length: i32, body_length: i64) -> Self {
        let mut bytes = [0u8; 24];
        bytes[0..8].copy_from_slice(&offset.to_le_bytes());
        bytes[8..12].copy_from_slice(&meta_data_length.to_le_bytes());
        bytes[16..24].copy_from_slice(&body_length.to_le_bytes());
        Self(bytes)
    }

    pub fn offset(&self) -> i64 {
        read_i64(&self.0, 0)
    }

    pub fn meta_data_length(&self) -> i32 {
        read_i32(&self.0, 8)
    }

    pub fn body_length(&self) -> i64 {
        read_i64(&self.0, 16)
    }
}

impl core::fmt::Debug for Block {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Block")
            .field("offset", &self.offset())
            .field("meta_data_length", &self.meta_data_length())
            .field("body_length", &self.body_length())
            .finish()
    }
}

impl flatbuffers::SimpleToVerifyInSlice for Block {}

impl<'a> flatbuffers::Follow<'a> for Block {
    type Inner = &'a Block;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        unsafe { flatbuffers::follow_cast_ref::<Block>(buf, loc) }
    }
}

impl flatbuffers::Push for Block {
    type Output = Block;

    #[inline]
    unsafe fn push(&self, dst: &mut [u8], _written_len: usize) {
        dst.copy_from_slice(&self.0);
    }

    #[inline]
    fn alignment() -> flatbuffers::PushAlignment {
        flatbuffers::PushAlignment::new(8)
    }
}

impl flatbuffers::Verifiable for Block {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.in_buffer::<Self>(pos)
    }
}

flatbuffer_table!(
    /// The trailing index of a file.
    Footer
);

pub struct FooterArgs<'a> {
    pub version: MetadataVersion,
    pub schema: Option<WIPOffset<Schema<'a>>>,
    pub dictionaries: Option<WIPOffset<Vector<'a, Block>>>,
    pub record_batches: Option<WIPOffset<Vector<'a, Block>>>,
    pub custom_metadata: Option<WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>>,
}

impl<'a> Footer<'a> {
    pub const VT_VERSION: VOffsetT = 4;
    pub const VT_SCHEMA: VOffsetT = 6;
    pub const VT_DICTIONARIES: VOffsetT = 8;
    pub const VT_RECORDBATCHES: VOffsetT = 10;
    pub const VT_CUSTOM_METADATA: VOffsetT = 12;

    pub fn create<'bldr, A: flatbuffers::Allocator + 'bldr>(
        fbb: &mut flatbuffers::FlatBufferBuilder<'bldr, A>,
        args: &FooterArgs<'_>,
    ) -> WIPOffset<Footer<'bldr>> {
        let start = fbb.start_table();
        if let Some(x) = args.custom_metadata {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_CUSTOM_METADATA, x);
        }
        if let Some(x) = args.record_batches {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_RECORDBATCHES, x);
        }
        if let Some(x) = args.dictionaries {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_DICTIONARIES, x);
        }
        if let Some(x) = args.schema {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_SCHEMA, x);
        }
        fbb.push_slot::<MetadataVersion>(Self::VT_VERSION, args.version, MetadataVersion::V1);
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
    pub fn schema(&self) -> Option<Schema<'a>> {
        // SAFETY: verified when the root was read
        unsafe { self._tab.get::<ForwardsUOffset<Schema>>(Self::VT_SCHEMA, None) }
    }

    #[inline]
    pub fn dictionaries(&self) -> Option<Vector<'a, Block>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, Block>>>(Self::VT_DICTIONARIES, None)
        }
    }

    #[inline]
    pub fn record_batches(&self) -> Option<Vector<'a, Block>> {
        // SAFETY: verified when the root was read
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, Block>>>(Self::VT_RECORDBATCHES, None)
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

impl flatbuffers::Verifiable for Footer<'_> {
    #[inline]
    fn run_verifier(
        v: &mut flatbuffers::Verifier,
        pos: usize,
    ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<MetadataVersion>("version", Self::VT_VERSION, false)?
            .visit_field::<ForwardsUOffset<Schema>>("schema", Self::VT_SCHEMA, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, Block>>>(
                "dictionaries",
                Self::VT_DICTIONARIES,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, Block>>>(
                "recordBatches",
                Self::VT_RECORDBATCHES,
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

/// Verifies and returns the root `Footer` of `buf`.
pub fn root_as_footer(buf: &[u8]) -> Result<Footer<'_>, flatbuffers::InvalidFlatbuffer> {
    flatbuffers::root::<Footer>(buf)
}
