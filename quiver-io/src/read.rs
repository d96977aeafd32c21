use std::io::{self, Read, Seek, SeekFrom};

use quiver_buffer::BufferMut;

use crate::READ_CHUNK_SIZE;

/// A reading channel that keeps count of the bytes consumed.
#[derive(Debug)]
pub struct ReadChannel<R> {
    read: R,
    bytes_read: u64,
}

impl<R> ReadChannel<R> {
    /// Wrap a reader.
    pub fn new(read: R) -> Self {
        Self {
            read,
            bytes_read: 0,
        }
    }

    /// Total bytes read through this channel.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// The wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.read
    }

    /// Unwrap the channel.
    pub fn into_inner(self) -> R {
        self.read
    }
}

impl<R: Read> ReadChannel<R> {
    /// Fill `buf` from the input, returning how many bytes were read.
    ///
    /// The count is short only when the input ended first; callers decide whether that is an
    /// orderly end of stream or a truncation.
    pub fn read_fully(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.bytes_read += filled as u64;
        Ok(filled)
    }

    /// Append up to `len` bytes to `buffer`, starting at its current length.
    ///
    /// Returns the number of bytes appended; the buffer only grows by that many. The buffer grows
    /// in steps of at most [`READ_CHUNK_SIZE`], so a `len` far beyond the input costs no more
    /// memory than the input itself.
    pub fn read_fully_into(&mut self, buffer: &mut BufferMut, len: usize) -> io::Result<usize> {
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(READ_CHUNK_SIZE);
            let start = buffer.len();
            let read = self.read_fully(buffer.push_zeroed(chunk))?;
            buffer.truncate(start + read);
            remaining -= read;
            if read < chunk {
                break;
            }
        }
        Ok(len - remaining)
    }

    /// Read and discard up to `len` bytes, returning how many were skipped.
    pub fn skip(&mut self, len: u64) -> io::Result<u64> {
        let skipped = io::copy(&mut (&mut self.read).take(len), &mut io::sink())?;
        self.bytes_read += skipped;
        Ok(skipped)
    }
}

impl<R: Read + Seek> ReadChannel<R> {
    /// Move to an absolute offset.
    pub fn set_position(&mut self, position: u64) -> io::Result<()> {
        log::trace!("seeking to {position}");
        self.read.seek(SeekFrom::Start(position)).map(|_| ())
    }

    /// Current absolute offset.
    pub fn position(&mut self) -> io::Result<u64> {
        self.read.stream_position()
    }

    /// Total size of the input, leaving the current position unchanged.
    pub fn size(&mut self) -> io::Result<u64> {
        let current = self.read.stream_position()?;
        let end = self.read.seek(SeekFrom::End(0))?;
        if current != end {
            self.read.seek(SeekFrom::Start(current))?;
        }
        Ok(end)
    }
}
