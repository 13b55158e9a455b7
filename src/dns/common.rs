use bitstream_io::{BigEndian, BitReader, BitWriter, Endianness};

use crate::error::Result;

/// A read position inside a complete message buffer.
///
/// Every decoder takes the whole message, not just the bytes of the record it
/// is reading, because compression pointers address the message from its first
/// byte. All bounds checks go through [`WireCursor::take`].
#[derive(Clone, Copy, Debug)]
pub struct WireCursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> WireCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        WireCursor { buf, offset }
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.offset)
    }

    pub(crate) fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Consumes `len` bytes, or returns `None` and leaves the cursor untouched.
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let bytes = self.buf.get(self.offset..end)?;
        self.offset = end;
        Some(bytes)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|bytes| bytes[0])
    }

    /// Consumes `len` bytes and returns a big-endian bit reader over exactly them.
    pub fn fields(&mut self, len: usize) -> Option<BitReader<&'a [u8], BigEndian>> {
        self.take(len).map(|bytes| BitReader::<_, BigEndian>::new(bytes))
    }
}

pub trait PacketComponent: Sized {
    fn write<E: Endianness>(&self, writer: &mut BitWriter<&mut Vec<u8>, E>) -> Result<()>;

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self>;

    /// Decodes one component at `offset` and returns it with the offset just past it.
    fn decode(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut cursor = WireCursor::at(buf, offset);
        let value = Self::read(&mut cursor)?;
        Ok((value, cursor.offset()))
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut writer = BitWriter::<_, BigEndian>::new(&mut buf);
            self.write(&mut writer)?;
        }
        Ok(buf)
    }
}
