//! LSB-first bit-field packing.
//!
//! Bit `n` of a buffer lives in byte `n / 8` at position `n % 8`, so a field written at offset 2
//! with width 10 occupies the top six bits of byte 0 and the low four bits of byte 1. Fields are
//! written least-significant bit first.

/// Widest field the codec can carry.
pub const MAX_WIDTH: u32 = u32::BITS;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    #[error("bit width {0} outside 0..=32")]
    InvalidWidth(u32),

    #[error("field at bit {offset} with width {width} overruns {len}-byte buffer")]
    OutOfBounds {
        offset: usize,
        width:  u32,
        len:    usize,
    },
}

/// Number of whole bytes needed to hold `bits` bits.
#[inline]
pub const fn bytes_for_bits(bits: usize) -> usize {
    (bits + 7) / 8
}

#[inline]
fn check(len: usize, offset: usize, width: u32) -> Result<(), Error> {
    if width > MAX_WIDTH {
        return Err(Error::InvalidWidth(width));
    }

    if offset + width as usize > len * 8 {
        return Err(Error::OutOfBounds {
            offset,
            width,
            len,
        });
    }

    Ok(())
}

/// Write the low `width` bits of `value` into `buf` starting at bit `offset`. Returns the offset
/// just past the written field.
pub fn encode(buf: &mut [u8], offset: usize, value: u32, width: u32) -> Result<usize, Error> {
    check(buf.len(), offset, width)?;

    for i in 0..width {
        let bit = offset + i as usize;
        let mask = 1u8 << (bit % 8);

        if (value >> i) & 1 == 1 {
            buf[bit / 8] |= mask;
        } else {
            buf[bit / 8] &= !mask;
        }
    }

    Ok(offset + width as usize)
}

/// Read `width` bits starting at bit `offset` as an unsigned integer.
pub fn decode(buf: &[u8], offset: usize, width: u32) -> Result<u32, Error> {
    check(buf.len(), offset, width)?;

    let value = (0..width).fold(0u32, |acc, i| {
        let bit = offset + i as usize;

        if (buf[bit / 8] >> (bit % 8)) & 1 == 1 {
            acc | (1 << i)
        } else {
            acc
        }
    });

    Ok(value)
}

/// Sequential writer over a pre-sized buffer.
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf:    &'a mut [u8],
    offset: usize,
}

impl<'a> BitWriter<'a> {
    #[inline]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::at(buf, 0)
    }

    #[inline]
    pub fn at(buf: &'a mut [u8], offset: usize) -> Self {
        Self {
            buf,
            offset,
        }
    }

    #[inline]
    pub fn put(&mut self, value: u32, width: u32) -> Result<&mut Self, Error> {
        self.offset = encode(self.buf, self.offset, value, width)?;
        Ok(self)
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Sequential reader, the inverse of [`BitWriter`].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf:    &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    #[inline]
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            offset,
        }
    }

    #[inline]
    pub fn take(&mut self, width: u32) -> Result<u32, Error> {
        let value = decode(self.buf, self.offset, width)?;
        self.offset += width as usize;

        Ok(value)
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}
