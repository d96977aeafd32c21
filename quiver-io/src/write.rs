use std::io::{self, Write};

use crate::ALIGNMENT;

static ZEROS: [u8; 512] = [0u8; 512];

/// A writing channel that tracks its position so callers can pad to [`ALIGNMENT`].
#[derive(Debug)]
pub struct WriteChannel<W> {
    write: W,
    position: u64,
}

impl<W: Write> WriteChannel<W> {
    /// Wrap a writer. Positions are counted from here.
    pub fn new(write: W) -> Self {
        Self { write, position: 0 }
    }

    /// Bytes written through this channel so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write all of `bytes`.
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write `len` zero bytes.
    pub fn write_zeros(&mut self, mut len: usize) -> io::Result<()> {
        while len > 0 {
            let chunk = len.min(ZEROS.len());
            self.write_all(&ZEROS[..chunk])?;
            len -= chunk;
        }
        Ok(())
    }

    /// Pad with zeros up to the next multiple of [`ALIGNMENT`], returning the padding written.
    pub fn align(&mut self) -> io::Result<usize> {
        let padding = padding_for(self.position);
        if padding > 0 {
            log::trace!("padding {padding} bytes at {}", self.position);
            self.write_zeros(padding)?;
        }
        Ok(padding)
    }

    /// Write a little-endian `i32`.
    pub fn write_i32_le(&mut self, value: i32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Write a little-endian `u32`.
    pub fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&value.to_le_bytes())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.write.flush()
    }

    /// The wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.write
    }

    /// Unwrap the channel without flushing.
    pub fn into_inner(self) -> W {
        self.write
    }
}

/// Zero bytes needed after `position` to reach the next [`ALIGNMENT`] boundary.
#[inline]
pub fn padding_for(position: u64) -> usize {
    let alignment = ALIGNMENT as u64;
    let padding = (alignment - position % alignment) % alignment;
    // always below ALIGNMENT
    usize::try_from(padding).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 7)]
    #[case(7, 1)]
    #[case(8, 0)]
    #[case(13, 3)]
    fn padding(#[case] position: u64, #[case] expected: usize) {
        assert_eq!(padding_for(position), expected);
    }

    #[test]
    fn align_writes_zeros() {
        let mut channel = WriteChannel::new(Vec::new());
        channel.write_i32_le(-1).unwrap();
        channel.write_all(&[9]).unwrap();
        assert_eq!(channel.align().unwrap(), 3);
        assert_eq!(channel.align().unwrap(), 0);
        assert_eq!(channel.position(), 8);
        assert_eq!(channel.into_inner(), vec![0xFF, 0xFF, 0xFF, 0xFF, 9, 0, 0, 0]);
    }

    #[test]
    fn large_zero_runs_are_chunked() {
        let mut channel = WriteChannel::new(Vec::new());
        channel.write_zeros(1300).unwrap();
        assert_eq!(channel.position(), 1300);
        assert!(channel.into_inner().iter().all(|b| *b == 0));
    }

    #[test]
    fn writes_through_to_file() {
        let mut file = tempfile::tempfile().unwrap();
        let mut channel = WriteChannel::new(&mut file);
        channel.write_u32_le(0xFFFF_FFFF).unwrap();
        channel.write_i32_le(16).unwrap();
        channel.flush().unwrap();
        drop(channel);

        let mut contents = Vec::new();
        std::io::Seek::rewind(&mut file).unwrap();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, [0xFF, 0xFF, 0xFF, 0xFF, 16, 0, 0, 0]);
    }
}
