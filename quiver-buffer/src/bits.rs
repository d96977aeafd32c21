//! Least-significant-bit-first bitmaps, as used for validity and boolean values.

use crate::ByteBuffer;

/// Bytes needed to hold `bits` bits.
#[inline]
pub const fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Reads bit `index`. Bits past the end of `bytes` read as unset.
#[inline]
pub fn get_bit(bytes: &[u8], index: usize) -> bool {
    bytes
        .get(index / 8)
        .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
}

/// Number of set bits among the first `len` bits.
pub fn count_set_bits(bytes: &[u8], len: usize) -> usize {
    let whole = (len / 8).min(bytes.len());
    let mut count: usize = bytes[..whole]
        .iter()
        .map(|byte| byte.count_ones() as usize)
        .sum();
    for index in whole * 8..len {
        count += usize::from(get_bit(bytes, index));
    }
    count
}

/// Appends bits one at a time and freezes them into a [`ByteBuffer`].
#[derive(Debug, Default, Clone)]
pub struct BitmapBuilder {
    bytes: Vec<u8>,
    len: usize,
}

impl BitmapBuilder {
    /// A builder with room for `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes_for_bits(capacity)),
            len: 0,
        }
    }

    /// Append one bit.
    pub fn append(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << (self.len % 8);
            }
        }
        self.len += 1;
    }

    /// Append the first `len` bits of `bytes`.
    pub fn append_bits(&mut self, bytes: &[u8], len: usize) {
        if self.len % 8 == 0 && len % 8 == 0 {
            self.bytes.extend_from_slice(&bytes[..len / 8]);
            self.len += len;
        } else {
            (0..len).for_each(|index| self.append(get_bit(bytes, index)));
        }
    }

    /// Number of bits appended.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bits were appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of unset bits appended so far.
    pub fn unset_count(&self) -> usize {
        self.len - count_set_bits(&self.bytes, self.len)
    }

    /// Freeze the bitmap.
    pub fn finish(self) -> ByteBuffer {
        ByteBuffer::from(self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn builder_is_lsb_first() {
        let mut builder = BitmapBuilder::default();
        [true, false, true, true, false, false, false, false, true]
            .into_iter()
            .for_each(|bit| builder.append(bit));
        assert_eq!(builder.len(), 9);
        assert_eq!(builder.unset_count(), 5);
        assert_eq!(builder.finish().as_slice(), &[0b0000_1101, 0b0000_0001]);
    }

    #[rstest]
    #[case(&[0xFF, 0x00], 16, 8)]
    #[case(&[0xFF, 0x00], 4, 4)]
    #[case(&[0b1010_1010], 7, 3)]
    #[case(&[], 0, 0)]
    fn counts_prefix(#[case] bytes: &[u8], #[case] len: usize, #[case] expected: usize) {
        assert_eq!(count_set_bits(bytes, len), expected);
    }

    #[test]
    fn append_bits_unaligned() {
        let mut builder = BitmapBuilder::default();
        builder.append(true);
        builder.append_bits(&[0b0000_0110], 3);
        assert_eq!(builder.finish().as_slice(), &[0b0000_1101]);
    }
}
