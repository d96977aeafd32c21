use quiver_flatbuffers::schema::MetadataVersion;

/// Knobs shared by every IPC reader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpcOptions {
    /// Frame messages without the `0xFFFFFFFF` continuation marker, as writers before Arrow 0.15
    /// did. Readers must be told which framing to expect.
    pub legacy_format: bool,
    /// The metadata version stamped on written messages.
    pub metadata_version: MetadataVersion,
}

impl Default for IpcOptions {
    fn default() -> Self {
        Self {
            legacy_format: false,
            metadata_version: MetadataVersion::V5,
        }
    }
}

impl IpcOptions {
    /// Options for the legacy framing.
    pub fn legacy() -> Self {
        Self {
            legacy_format: true,
            ..Self::default()
        }
    }

    /// Bytes in front of every message's metadata.
    #[inline]
    pub fn prefix_length(&self) -> usize {
        if self.legacy_format { 4 } else { 8 }
    }
}
