use std::io::Write;

use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_io::{WriteChannel, padding_for};

use crate::messages::{CONTINUATION_MARKER, EncodedMessage};
use crate::{ArrowBlock, IpcOptions};

/// Frames encoded messages onto a [`WriteChannel`].
///
/// Each message is written as an optional continuation marker, the little-endian metadata length,
/// the metadata padded so the frame so far ends on an 8-byte boundary, and then the body buffers,
/// each padded to 8 bytes.
#[derive(Debug)]
pub struct MessageWriter<W> {
    channel: WriteChannel<W>,
    options: IpcOptions,
}

impl<W: Write> MessageWriter<W> {
    pub fn new(write: W, options: IpcOptions) -> Self {
        Self {
            channel: WriteChannel::new(write),
            options,
        }
    }

    /// Write one message, returning the block it occupies.
    pub fn write_message(&mut self, message: &EncodedMessage) -> QuiverResult<ArrowBlock> {
        let start = self.channel.position();
        let prefix = self.options.prefix_length();
        let padding = padding_for((prefix + message.metadata.len()) as u64);
        let padded = message.metadata.len() + padding;
        let length = i32::try_from(padded)
            .map_err(|_| quiver_err!(Framing: "metadata of {} bytes overflows", padded))?;
        let metadata_length = u32::try_from(prefix + padded)
            .map_err(|_| quiver_err!(Framing: "metadata of {} bytes overflows", padded))?;

        if !self.options.legacy_format {
            self.channel.write_u32_le(CONTINUATION_MARKER)?;
        }
        self.channel.write_i32_le(length)?;
        self.channel.write_all(&message.metadata)?;
        self.channel.write_zeros(padding)?;
        log::trace!("padded {} bytes of metadata with {}", message.metadata.len(), padding);

        let body_start = self.channel.position();
        for buffer in &message.body {
            self.channel.write_all(buffer)?;
            self.channel.align()?;
        }
        let written = self.channel.position() - body_start;
        if written != message.body_length {
            quiver_bail!(
                AssertionFailed: "wrote a body of {} bytes, the header declares {}",
                written,
                message.body_length
            );
        }

        let block = ArrowBlock::new(start, metadata_length, message.body_length);
        log::debug!("wrote {block}");
        Ok(block)
    }

    /// Write the end-of-stream marker.
    pub fn write_eos(&mut self) -> QuiverResult<()> {
        if !self.options.legacy_format {
            self.channel.write_u32_le(CONTINUATION_MARKER)?;
        }
        self.channel.write_i32_le(0)?;
        log::debug!("wrote end of stream at {}", self.channel.position());
        Ok(())
    }

    /// Bytes written so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.channel.position()
    }

    #[inline]
    pub fn options(&self) -> &IpcOptions {
        &self.options
    }

    /// The underlying channel, for writing bytes outside any message frame.
    pub fn channel_mut(&mut self) -> &mut WriteChannel<W> {
        &mut self.channel
    }

    pub fn flush(&mut self) -> QuiverResult<()> {
        Ok(self.channel.flush()?)
    }

    /// Unwrap the writer without flushing.
    pub fn into_inner(self) -> W {
        self.channel.into_inner()
    }
}
