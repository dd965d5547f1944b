use crate::error::{Error, Result};

/// Little-endian cursor over a byte slice.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn at(data: &'a [u8], pos: usize) -> Result<Self> {
        if pos > data.len() {
            return Err(Error::UnexpectedEof { offset: pos });
        }
        Ok(Self { data, pos })
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::UnexpectedEof { offset: self.pos })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        let lo = self.u32()? as u64;
        let hi = self.u32()? as u64;
        Ok(lo | (hi << 32))
    }

    /// Read an index stored in `width` bytes (2 or 4).
    pub(crate) fn index(&mut self, width: usize) -> Result<u32> {
        match width {
            2 => self.u16().map(u32::from),
            _ => self.u32(),
        }
    }

    /// Read a NUL-terminated name padded with zeros to a 4-byte boundary.
    pub(crate) fn padded_name(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        let rest = &self.data[start..];
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(Error::UnexpectedEof { offset: start })?;
        let padded = (len + 1).div_ceil(4) * 4;
        self.skip(padded)?;
        Ok(&rest[..len])
    }
}
