use std::{fmt, str::FromStr};

use bitstream_io::{BitWrite, BitWriter, Endianness};
use tracing::trace;

use super::{
    common::{PacketComponent, WireCursor},
    constants::{MAX_LABEL_LEN, MAX_NAME_LEN, POINTER_OFFSET_MASK, POINTER_TAG},
};
use crate::error::{CodecError, Result};

/// A domain name as a sequence of labels, root last and implicit.
///
/// Labels are arbitrary octets; nothing is case-folded or charset checked.
/// Every constructed `Name` fits the wire limits, so writing one cannot fail
/// on a well-behaved sink.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Name {
    labels: Vec<Vec<u8>>,
}

impl Name {
    pub fn root() -> Self {
        Name::default()
    }

    pub fn from_labels<I, L>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut wire_len = 1;
        let mut collected = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(CodecError::InvalidName("empty label".to_string()));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(CodecError::InvalidName(format!(
                    "label of {} bytes exceeds {}",
                    label.len(),
                    MAX_LABEL_LEN
                )));
            }
            wire_len += label.len() + 1;
            if wire_len > MAX_NAME_LEN {
                return Err(CodecError::NameTooLong);
            }
            collected.push(label.to_vec());
        }
        Ok(Name { labels: collected })
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(Vec::as_slice)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Length of the uncompressed wire form, terminator included.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }
}

impl FromStr for Name {
    type Err = CodecError;

    /// Parses dotted text, the inverse of `Display`.
    ///
    /// `\DDD` is a decimal byte and `\X` a literal character, so escaped dots
    /// stay inside their label. A single trailing dot is accepted; `""` and
    /// `"."` are the root.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Name::root());
        }

        let mut labels = Vec::new();
        let mut label = Vec::new();
        let mut bytes = s.bytes();
        while let Some(byte) = bytes.next() {
            match byte {
                b'.' => labels.push(std::mem::take(&mut label)),
                b'\\' => label.push(unescape(&mut bytes, s)?),
                _ => label.push(byte),
            }
        }
        // Empty only when the text ended with an unescaped dot.
        if !label.is_empty() {
            labels.push(label);
        }
        Name::from_labels(labels)
    }
}

fn unescape(bytes: &mut std::str::Bytes<'_>, text: &str) -> Result<u8> {
    let invalid = || CodecError::InvalidName(format!("bad escape in {:?}", text));
    let first = bytes.next().ok_or_else(invalid)?;
    if !first.is_ascii_digit() {
        return Ok(first);
    }

    let mut value = u16::from(first - b'0');
    for _ in 0..2 {
        let digit = bytes.next().filter(u8::is_ascii_digit).ok_or_else(invalid)?;
        value = value * 10 + u16::from(digit - b'0');
    }
    u8::try_from(value).map_err(|_| invalid())
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            for &byte in label {
                if byte.is_ascii_graphic() && byte != b'.' && byte != b'\\' {
                    write!(f, "{}", byte as char)?;
                } else {
                    write!(f, "\\{:03}", byte)?;
                }
            }
        }
        Ok(())
    }
}

impl PacketComponent for Name {
    /// Writes the full label sequence. Names are never compressed on output.
    fn write<E: Endianness>(&self, writer: &mut BitWriter<&mut Vec<u8>, E>) -> Result<()> {
        for label in &self.labels {
            writer.write_var::<u8>(8, label.len() as u8)?;
            writer.write_bytes(label)?;
        }
        writer.write_var::<u8>(8, 0)?;
        Ok(())
    }

    /// Reads a name, following compression pointers.
    ///
    /// Each pointer must target an offset lower than every offset visited so
    /// far in this name, so chains always terminate. On return the cursor sits
    /// after the terminator, or after the first pointer if one was followed.
    fn read(cursor: &mut WireCursor<'_>) -> Result<Self> {
        let mut walker = *cursor;
        let mut lowest_visited = walker.offset();
        let mut resume_at = None;
        let mut wire_len = 1;
        let mut labels = Vec::new();

        loop {
            let at = walker.offset();
            let len = walker
                .read_u8()
                .ok_or(CodecError::TruncatedName { offset: at })?;

            match len & POINTER_TAG {
                POINTER_TAG => {
                    let low = walker
                        .read_u8()
                        .ok_or(CodecError::TruncatedName { offset: at })?;
                    let target = (u16::from_be_bytes([len, low]) & POINTER_OFFSET_MASK) as usize;
                    if target >= lowest_visited {
                        return Err(CodecError::PointerLoop { offset: at, target });
                    }
                    trace!("Following compression pointer at {} to {}", at, target);
                    resume_at.get_or_insert(walker.offset());
                    lowest_visited = target;
                    walker.seek(target);
                }
                0 if len == 0 => break,
                0 => {
                    let label = walker
                        .take(len as usize)
                        .ok_or(CodecError::TruncatedName { offset: at })?;
                    wire_len += label.len() + 1;
                    if wire_len > MAX_NAME_LEN {
                        return Err(CodecError::NameTooLong);
                    }
                    labels.push(label.to_vec());
                }
                _ => return Err(CodecError::InvalidLabelLength { offset: at, byte: len }),
            }
        }

        cursor.seek(resume_at.unwrap_or(walker.offset()));
        Ok(Name { labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    #[test]
    fn parses_dotted_text() {
        let n = name("codecrafters.io");
        assert_eq!(n.label_count(), 2);
        assert_eq!(n.labels().collect::<Vec<_>>(), vec![&b"codecrafters"[..], b"io"]);
        assert_eq!(n, name("codecrafters.io."));
        assert!(name("").is_root());
        assert!(name(".").is_root());
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!("a..b".parse::<Name>(), Err(CodecError::InvalidName(_))));
        assert!(matches!(
            "a".repeat(64).parse::<Name>(),
            Err(CodecError::InvalidName(_))
        ));
        let long = vec!["a".repeat(63); 4].join(".");
        assert_eq!(long.parse::<Name>(), Err(CodecError::NameTooLong));
    }

    #[test]
    fn display_escapes_unprintable_bytes() {
        let n = Name::from_labels([&b"a.b"[..], b"c\x00"]).unwrap();
        assert_eq!(n.to_string(), "a\\046b.c\\000");
        assert_eq!(Name::root().to_string(), ".");
    }

    #[test]
    fn parses_its_own_display_form() {
        let n = Name::from_labels([&b"a.b"[..], b"c\x00", b"\\x"]).unwrap();
        let text = n.to_string();
        assert_eq!(text.parse::<Name>(), Ok(n));

        let dotted = name("a\\.b.c");
        assert_eq!(dotted.label_count(), 2);
        assert_eq!(dotted.labels().next(), Some(&b"a.b"[..]));
        assert_eq!(name("\\065bc\\.."), Name::from_labels([&b"Abc."[..]]).unwrap());
    }

    #[test]
    fn rejects_bad_escapes() {
        for text in ["a\\", "a\\25", "a\\2x5", "a\\256"] {
            assert!(
                matches!(text.parse::<Name>(), Err(CodecError::InvalidName(_))),
                "{text} should not parse"
            );
        }
    }

    #[test]
    fn encodes_uncompressed_labels() {
        let bytes = name("codecrafters.io").to_bytes().unwrap();
        let mut expected = vec![12];
        expected.extend_from_slice(b"codecrafters");
        expected.push(2);
        expected.extend_from_slice(b"io");
        expected.push(0);
        assert_eq!(bytes, expected);
        assert_eq!(bytes.len(), name("codecrafters.io").wire_len());
        assert_eq!(Name::root().to_bytes().unwrap(), vec![0]);
    }

    #[test]
    fn pointer_only_name_matches_target() {
        let mut buf = name("example.com").to_bytes().unwrap();
        let second = buf.len();
        buf.extend_from_slice(&[0xC0, 0x00]);

        let (first, next) = Name::decode(&buf, 0).unwrap();
        assert_eq!(next, second);
        let (again, next) = Name::decode(&buf, second).unwrap();
        assert_eq!(again, first);
        assert_eq!(next, second + 2);
    }

    #[test]
    fn pointer_splices_suffix() {
        let mut buf = name("example.com").to_bytes().unwrap();
        let start = buf.len();
        buf.extend_from_slice(&[3, b'w', b'w', b'w', 0xC0, 0x00, 0xFF]);

        let (n, next) = Name::decode(&buf, start).unwrap();
        assert_eq!(n, name("www.example.com"));
        assert_eq!(next, start + 6);
    }

    #[test]
    fn chained_pointers_decrease() {
        // 0: "com", 5: "example" -> 0, 15: "www" -> 5
        let buf = [
            3, b'c', b'o', b'm', 0, 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0xC0, 0x00, 3,
            b'w', b'w', b'w', 0xC0, 0x05,
        ];
        let (n, next) = Name::decode(&buf, 15).unwrap();
        assert_eq!(n, name("www.example.com"));
        assert_eq!(next, buf.len());
    }

    #[test]
    fn self_pointer_is_a_loop() {
        let buf = [0xC0, 0x00];
        assert_eq!(
            Name::decode(&buf, 0),
            Err(CodecError::PointerLoop { offset: 0, target: 0 })
        );
    }

    #[test]
    fn forward_pointer_is_a_loop() {
        let buf = [0xC0, 0x02, 0x00];
        assert_eq!(
            Name::decode(&buf, 0),
            Err(CodecError::PointerLoop { offset: 0, target: 2 })
        );
    }

    #[test]
    fn pointer_back_into_the_same_name_is_a_loop() {
        // "a" at 0, then a pointer at 2 back to 0: lands on the start of this name.
        let buf = [1, b'a', 0xC0, 0x00];
        assert_eq!(
            Name::decode(&buf, 0),
            Err(CodecError::PointerLoop { offset: 2, target: 0 })
        );
    }

    #[test]
    fn two_pointers_bouncing_are_rejected() {
        // 0: ptr -> 2, 2: ptr -> 0. Starting at 2 goes to 0, which then points forward.
        let buf = [0xC0, 0x02, 0xC0, 0x00];
        assert_eq!(
            Name::decode(&buf, 2),
            Err(CodecError::PointerLoop { offset: 0, target: 2 })
        );
    }

    #[test]
    fn reserved_length_bits_are_invalid() {
        assert_eq!(
            Name::decode(&[0x40, 0x00], 0),
            Err(CodecError::InvalidLabelLength { offset: 0, byte: 0x40 })
        );
        assert_eq!(
            Name::decode(&[1, b'a', 0x80], 0),
            Err(CodecError::InvalidLabelLength { offset: 2, byte: 0x80 })
        );
    }

    #[test]
    fn truncated_names() {
        assert_eq!(Name::decode(&[], 0), Err(CodecError::TruncatedName { offset: 0 }));
        assert_eq!(
            Name::decode(&[5, b'a', b'b'], 0),
            Err(CodecError::TruncatedName { offset: 0 })
        );
        assert_eq!(
            Name::decode(&[1, b'a'], 0),
            Err(CodecError::TruncatedName { offset: 2 })
        );
        assert_eq!(
            Name::decode(&[0x00, 0xC0], 1),
            Err(CodecError::TruncatedName { offset: 1 })
        );
    }

    #[test]
    fn labels_are_not_charset_checked() {
        let buf = [2, 0xFF, 0x00, 0];
        let (n, _) = Name::decode(&buf, 0).unwrap();
        assert_eq!(n.labels().next(), Some(&[0xFF, 0x00][..]));
    }

    #[test]
    fn overlong_wire_name_is_rejected() {
        let mut buf = Vec::new();
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'x'; 63]);
        }
        buf.push(0);
        assert_eq!(Name::decode(&buf, 0), Err(CodecError::NameTooLong));
    }
}
