use std::fmt;

use bitstream_io::{BitRead, BitWrite, BitWriter, Endianness};

use super::{
    common::{PacketComponent, WireCursor},
    enums::{RecordClass, RecordType},
    name::Name,
};
use crate::error::{CodecError, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(name: Name, qtype: RecordType, qclass: RecordClass) -> Self {
        Question {
            name,
            qtype,
            qclass,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.qclass, self.qtype)
    }
}

impl PacketComponent for Question {
    fn write<E: Endianness>(&self, writer: &mut BitWriter<&mut Vec<u8>, E>) -> Result<()> {
        self.name.write(writer)?;
        writer.write_var::<u16>(16, self.qtype.into())?;
        writer.write_var::<u16>(16, self.qclass.into())?;
        Ok(())
    }

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self> {
        let name = Name::read(cursor)?;
        let offset = cursor.offset();
        let mut fields = cursor
            .fields(4)
            .ok_or(CodecError::TruncatedRecord { offset })?;
        let qtype = RecordType(fields.read_var::<u16>(16)?);
        let qclass = RecordClass(fields.read_var::<u16>(16)?);
        Ok(Question {
            name,
            qtype,
            qclass,
        })
    }
}
