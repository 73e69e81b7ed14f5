// Bit packing for the Huffman codec.
//
// Bits are packed MSB-first. The final partial byte is filled with zero bits
// and the number of fill bits (0-7) is reported alongside the bytes, so the
// exact bit length can be recovered without a separate length field.

use crate::error::{CodecError, Result};

/// Accumulates bits MSB-first into a byte buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Partial byte, MSB-aligned.
    acc: u8,
    /// Bits held in `acc` (0-7).
    filled: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer sized for roughly `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            acc: 0,
            filled: 0,
        }
    }

    /// Append one bit.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        self.acc |= (bit as u8) << (7 - self.filled);
        self.filled += 1;
        if self.filled == 8 {
            self.bytes.push(self.acc);
            self.acc = 0;
            self.filled = 0;
        }
    }

    /// Append the low `len` bits of `value`, most significant first.
    ///
    /// `len` must be at most 64.
    pub fn push_bits(&mut self, value: u64, len: u8) {
        debug_assert!(len <= 64);
        for shift in (0..len).rev() {
            self.push((value >> shift) & 1 == 1);
        }
    }

    /// Total number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.filled as usize
    }

    /// Flush the partial byte and return `(bytes, padding)`.
    pub fn finish(mut self) -> (Vec<u8>, u8) {
        if self.filled == 0 {
            return (self.bytes, 0);
        }
        let padding = 8 - self.filled;
        self.bytes.push(self.acc);
        (self.bytes, padding)
    }
}

/// Iterates the meaningful bits of a packed buffer, skipping trailing padding.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data` whose last `padding` bits are fill.
    pub fn new(data: &'a [u8], padding: u8) -> Result<Self> {
        if padding > 7 {
            return Err(CodecError::TruncatedStream(format!(
                "padding of {padding} bits exceeds one byte"
            )));
        }
        if data.is_empty() && padding != 0 {
            return Err(CodecError::TruncatedStream(format!(
                "padding of {padding} bits on an empty stream"
            )));
        }
        Ok(Self {
            data,
            pos: 0,
            end: data.len() * 8 - padding as usize,
        })
    }

    /// Bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        if self.pos >= self.end {
            return None;
        }
        let byte = self.data[self.pos / 8];
        let bit = (byte >> (7 - (self.pos % 8))) & 1 == 1;
        self.pos += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitReader<'_> {}

/// Pack a bit sequence into bytes, returning the number of fill bits added.
pub fn pack(bits: &[bool]) -> (Vec<u8>, u8) {
    let mut writer = BitWriter::with_capacity(bits.len());
    for &bit in bits {
        writer.push(bit);
    }
    writer.finish()
}

/// Recover the bit sequence written by [`pack`].
pub fn unpack(bytes: &[u8], padding: u8) -> Result<Vec<bool>> {
    Ok(BitReader::new(bytes, padding)?.collect())
}
