use flatbuffers::{FlatBufferBuilder, Follow, WIPOffset};
use itertools::Itertools;
use quiver_buffer::ByteBuffer;
use quiver_dtype::flatbuffers::{read_metadata, write_metadata};
use quiver_dtype::{Metadata, Schema};
use quiver_error::{QuiverError, QuiverResult, quiver_err};
use quiver_flatbuffers::file as fb;
use quiver_flatbuffers::file::Block;
use quiver_flatbuffers::schema::MetadataVersion;
use quiver_flatbuffers::{FlatBufferRoot, ReadFlatBuffer, WriteFlatBuffer, WriteFlatBufferExt};
use quiver_ipc::ArrowBlock;

/// The index at the end of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowFooter {
    schema: Schema,
    dictionaries: Vec<ArrowBlock>,
    record_batches: Vec<ArrowBlock>,
    metadata: Metadata,
}

impl ArrowFooter {
    /// A footer for a file whose schema message held `schema`.
    pub fn new(
        schema: Schema,
        dictionaries: Vec<ArrowBlock>,
        record_batches: Vec<ArrowBlock>,
        metadata: Metadata,
    ) -> Self {
        Self {
            schema,
            dictionaries,
            record_batches,
            metadata,
        }
    }

    /// The schema, in message format.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn dictionaries(&self) -> &[ArrowBlock] {
        &self.dictionaries
    }

    #[inline]
    pub fn record_batches(&self) -> &[ArrowBlock] {
        &self.record_batches
    }

    /// Custom metadata stored in the footer itself.
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Serialize the footer as a standalone flatbuffer stamped with `version`.
    pub fn encode(&self, version: MetadataVersion) -> QuiverResult<ByteBuffer> {
        let encoded = EncodedFooter {
            footer: self,
            version,
            dictionaries: self
                .dictionaries
                .iter()
                .map(ArrowBlock::to_flatbuffer)
                .try_collect()?,
            record_batches: self
                .record_batches
                .iter()
                .map(ArrowBlock::to_flatbuffer)
                .try_collect()?,
        };
        Ok(encoded.write_flatbuffer_bytes())
    }
}

/// A footer whose blocks have been narrowed to their wire widths.
struct EncodedFooter<'a> {
    footer: &'a ArrowFooter,
    version: MetadataVersion,
    dictionaries: Vec<Block>,
    record_batches: Vec<Block>,
}

impl FlatBufferRoot for EncodedFooter<'_> {}

impl WriteFlatBuffer for EncodedFooter<'_> {
    type Target<'a> = fb::Footer<'a>;

    fn write_flatbuffer<'fb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fb>,
    ) -> WIPOffset<Self::Target<'fb>> {
        let schema = self.footer.schema.write_flatbuffer(fbb);
        let dictionaries = fbb.create_vector(&self.dictionaries);
        let record_batches = fbb.create_vector(&self.record_batches);
        let custom_metadata = write_metadata(fbb, &self.footer.metadata);
        fb::Footer::create(
            fbb,
            &fb::FooterArgs {
                version: self.version,
                schema: Some(schema),
                dictionaries: Some(dictionaries),
                record_batches: Some(record_batches),
                custom_metadata,
            },
        )
    }
}

impl ReadFlatBuffer for ArrowFooter {
    type Source<'a> = fb::Footer<'a>;
    type Error = QuiverError;

    fn read_flatbuffer<'buf>(
        fb: &<Self::Source<'buf> as Follow<'buf>>::Inner,
    ) -> Result<Self, Self::Error> {
        let schema = fb
            .schema()
            .ok_or_else(|| quiver_err!(InvalidSerde: "file footer without a schema"))?;
        let dictionaries: Vec<ArrowBlock> = fb
            .dictionaries()
            .unwrap_or_default()
            .iter()
            .map(|block| ArrowBlock::try_from_flatbuffer(&block))
            .try_collect()?;
        let record_batches: Vec<ArrowBlock> = fb
            .record_batches()
            .unwrap_or_default()
            .iter()
            .map(|block| ArrowBlock::try_from_flatbuffer(&block))
            .try_collect()?;
        Ok(Self {
            schema: Schema::read_flatbuffer(&schema)?,
            dictionaries,
            record_batches,
            metadata: read_metadata(fb.custom_metadata())?,
        })
    }
}
