use bitstream_io::{BitRead, BitWrite, BitWriter, Endianness};

use super::{
    common::{PacketComponent, WireCursor},
    constants::HEADER_LEN,
};
use crate::error::{CodecError, Result};

/// The fixed 12-byte message header.
///
/// `opcode`, `reserved` and `response_code` are 4, 3 and 4 bit fields; any
/// higher bits are dropped when the header is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub is_response: bool,
    pub opcode: u8,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub reserved: u8,
    pub response_code: u8,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl PacketComponent for Header {
    fn write<E: Endianness>(&self, writer: &mut BitWriter<&mut Vec<u8>, E>) -> Result<()> {
        writer.write_var::<u16>(16, self.id)?;
        writer.write_var::<u8>(1, self.is_response as u8)?;
        writer.write_var::<u8>(4, self.opcode & 0x0F)?;
        writer.write_var::<u8>(1, self.authoritative as u8)?;
        writer.write_var::<u8>(1, self.truncated as u8)?;
        writer.write_var::<u8>(1, self.recursion_desired as u8)?;
        writer.write_var::<u8>(1, self.recursion_available as u8)?;
        writer.write_var::<u8>(3, self.reserved & 0x07)?;
        writer.write_var::<u8>(4, self.response_code & 0x0F)?;
        writer.write_var::<u16>(16, self.question_count)?;
        writer.write_var::<u16>(16, self.answer_count)?;
        writer.write_var::<u16>(16, self.authority_count)?;
        writer.write_var::<u16>(16, self.additional_count)?;
        Ok(())
    }

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self> {
        let len = cursor.remaining();
        let mut reader = cursor
            .fields(HEADER_LEN)
            .ok_or(CodecError::TruncatedHeader { len })?;

        Ok(Header {
            id: reader.read_var::<u16>(16)?,
            is_response: reader.read_var::<u8>(1)? == 1,
            opcode: reader.read_var::<u8>(4)?,
            authoritative: reader.read_var::<u8>(1)? == 1,
            truncated: reader.read_var::<u8>(1)? == 1,
            recursion_desired: reader.read_var::<u8>(1)? == 1,
            recursion_available: reader.read_var::<u8>(1)? == 1,
            reserved: reader.read_var::<u8>(3)?,
            response_code: reader.read_var::<u8>(4)?,
            question_count: reader.read_var::<u16>(16)?,
            answer_count: reader.read_var::<u16>(16)?,
            authority_count: reader.read_var::<u16>(16)?,
            additional_count: reader.read_var::<u16>(16)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flag_combination_round_trips() {
        for bits in 0u8..32 {
            let header = Header {
                id: 0xBEEF,
                is_response: bits & 0b00001 != 0,
                authoritative: bits & 0b00010 != 0,
                truncated: bits & 0b00100 != 0,
                recursion_desired: bits & 0b01000 != 0,
                recursion_available: bits & 0b10000 != 0,
                opcode: bits & 0x0F,
                reserved: bits & 0x07,
                response_code: (bits >> 1) & 0x0F,
                question_count: 1,
                ..Default::default()
            };

            let bytes = header.to_bytes().unwrap();
            assert_eq!(bytes.len(), HEADER_LEN);
            let (parsed, next) = Header::decode(&bytes, 0).unwrap();
            assert_eq!(parsed, header);
            assert_eq!(next, HEADER_LEN);
        }
    }

    #[test]
    fn standard_response_flags() {
        let header = Header {
            is_response: true,
            recursion_desired: true,
            ..Default::default()
        };

        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes[2], 0x81);
        assert_eq!(bytes[3], 0x00);
    }

    #[test]
    fn out_of_range_fields_are_masked() {
        let header = Header {
            opcode: 0xF5,
            reserved: 0xFF,
            response_code: 0x14,
            ..Default::default()
        };

        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes[2], 0x05 << 3);
        assert_eq!(bytes[3], 0x70 | 0x04);
    }

    #[test]
    fn short_buffer_is_truncated_header() {
        let err = Header::decode(&[0u8; 11], 0).unwrap_err();
        assert_eq!(err, CodecError::TruncatedHeader { len: 11 });
    }
}
