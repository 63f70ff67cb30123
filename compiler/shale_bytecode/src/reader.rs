//! Bounds-checked little-endian cursor over a byte buffer.

use crate::error::DecodeError;

pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, pos: 0 }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    pub(crate) fn read_exact(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let eof = DecodeError::UnexpectedEof {
            offset: self.pos,
            needed: n,
        };
        let end = self.pos.checked_add(n).ok_or(DecodeError::LengthOverflow {
            length: n as u64,
            offset: self.pos,
        })?;
        let slice = self.bytes.get(self.pos..end).ok_or(eof)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub(crate) fn read_bool(&mut self) -> Result<bool, DecodeError> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidFlag { value, offset }),
        }
    }

    /// Read an element count and check that at least `min_size` bytes per
    /// element remain, so corrupt counts never drive large allocations.
    pub(crate) fn read_count(&mut self, min_size: usize) -> Result<usize, DecodeError> {
        let count = self.read_u32()?;
        self.check_count(u64::from(count), min_size)
    }

    /// 64-bit variant of [`read_count`](Self::read_count).
    pub(crate) fn read_count_u64(&mut self, min_size: usize) -> Result<usize, DecodeError> {
        let count = self.read_u64()?;
        self.check_count(count, min_size)
    }

    fn check_count(&self, count: u64, min_size: usize) -> Result<usize, DecodeError> {
        let overflow = DecodeError::LengthOverflow {
            length: count,
            offset: self.pos,
        };
        let count = usize::try_from(count).map_err(|_| overflow)?;
        let min_bytes = count.checked_mul(min_size).ok_or(DecodeError::LengthOverflow {
            length: count as u64,
            offset: self.pos,
        })?;
        if min_bytes > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: min_bytes,
            });
        }
        Ok(count)
    }

    pub(crate) fn read_string(&mut self) -> Result<String, DecodeError> {
        let length = self.read_count(1)?;
        let offset = self.pos;
        let bytes = self.read_exact(length)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }
}
