/// Size of the fixed message header.
pub const HEADER_LEN: usize = 12;

/// Longest label a length octet can describe.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest name on the wire, length octets and terminator included (RFC 1035 2.3.4).
pub const MAX_NAME_LEN: usize = 255;

/// Classic UDP message size limit; no EDNS negotiation.
pub const MAX_UDP_PAYLOAD: usize = 512;

/// Top two bits of a length octet that mark a compression pointer.
pub const POINTER_TAG: u8 = 0b1100_0000;

/// Low 14 bits of a compression pointer hold the target offset.
pub const POINTER_OFFSET_MASK: u16 = 0x3FFF;
