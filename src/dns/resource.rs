use std::{fmt, net::Ipv4Addr};

use bitstream_io::{BitRead, BitWrite, BitWriter, Endianness};
use tracing::trace;

use super::{
    common::{PacketComponent, WireCursor},
    enums::{RecordClass, RecordType},
    name::Name,
};
use crate::error::{CodecError, Result};

/// A resource record with its RDATA kept as raw bytes.
///
/// RDLENGTH is not stored; it is `rdata.len()` on output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    pub fn new(
        name: Name,
        rtype: RecordType,
        rclass: RecordClass,
        ttl: u32,
        rdata: Vec<u8>,
    ) -> Self {
        ResourceRecord {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        }
    }

    /// An `IN A` record.
    pub fn a(name: Name, ttl: u32, address: Ipv4Addr) -> Self {
        Self::new(
            name,
            RecordType::A,
            RecordClass::IN,
            ttl,
            address.octets().to_vec(),
        )
    }

    /// The address carried by an `A` record, if this is one with a 4-byte payload.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        if self.rtype != RecordType::A {
            return None;
        }
        let octets: [u8; 4] = self.rdata.as_slice().try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name, self.ttl, self.rclass, self.rtype
        )?;
        match self.ipv4() {
            Some(address) => write!(f, " {}", address),
            None => write!(f, " ({} bytes)", self.rdata.len()),
        }
    }
}

impl PacketComponent for ResourceRecord {
    fn write<E: Endianness>(&self, writer: &mut BitWriter<&mut Vec<u8>, E>) -> Result<()> {
        let rdlength =
            u16::try_from(self.rdata.len()).map_err(|_| CodecError::RdataTooLong(self.rdata.len()))?;
        self.name.write(writer)?;
        writer.write_var::<u16>(16, self.rtype.into())?;
        writer.write_var::<u16>(16, self.rclass.into())?;
        writer.write_var::<u32>(32, self.ttl)?;
        writer.write_var::<u16>(16, rdlength)?;
        writer.write_bytes(&self.rdata)?;
        Ok(())
    }

    fn read(cursor: &mut WireCursor<'_>) -> Result<Self> {
        let name = Name::read(cursor)?;
        let offset = cursor.offset();
        let mut fields = cursor
            .fields(10)
            .ok_or(CodecError::TruncatedRecord { offset })?;
        let rtype = RecordType(fields.read_var::<u16>(16)?);
        let rclass = RecordClass(fields.read_var::<u16>(16)?);
        let ttl = fields.read_var::<u32>(32)?;
        let declared = fields.read_var::<u16>(16)? as usize;

        let available = cursor.remaining();
        let rdata = cursor
            .take(declared)
            .ok_or(CodecError::RecordLengthMismatch {
                declared,
                available,
            })?
            .to_vec();
        trace!("Read {} {} record for {}, {} bytes of data", rclass, rtype, name, declared);

        Ok(ResourceRecord {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        })
    }
}
