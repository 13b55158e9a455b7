use std::fmt;

use thiserror::Error;

use crate::dns::enums::ResponseCode;

/// Message section a record was being decoded from when decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Question,
    Answer,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Question => write!(f, "question"),
            Section::Answer => write!(f, "answer"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Truncated header: need 12 bytes, have {len}")]
    TruncatedHeader { len: usize },

    #[error("Truncated name at offset {offset}")]
    TruncatedName { offset: usize },

    #[error("Truncated record at offset {offset}")]
    TruncatedRecord { offset: usize },

    #[error("Invalid label length byte {byte:#04x} at offset {offset}")]
    InvalidLabelLength { offset: usize, byte: u8 },

    #[error("Compression pointer at offset {offset} to {target} does not point backward")]
    PointerLoop { offset: usize, target: usize },

    #[error("Record data length {declared} exceeds the {available} bytes remaining")]
    RecordLengthMismatch { declared: usize, available: usize },

    #[error("Record data of {0} bytes does not fit RDLENGTH")]
    RdataTooLong(usize),

    #[error("{count} {section} records do not fit a 16-bit count")]
    TooManyRecords { section: Section, count: usize },

    #[error("DNS name too long")]
    NameTooLong,

    #[error("Invalid DNS name: {0}")]
    InvalidName(String),

    #[error("Invalid {section} record {index}: {source}")]
    Section {
        section: Section,
        index: usize,
        #[source]
        source: Box<CodecError>,
    },

    #[error("Invalid bit stream: {0}")]
    Bitstream(String),
}

impl CodecError {
    /// Wraps a record-level failure with the section and index it occurred in.
    pub fn in_section(self, section: Section, index: usize) -> Self {
        CodecError::Section {
            section,
            index,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any section annotation removed.
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::Section { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Bitstream(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid upstream resolver: {0}")]
    InvalidResolver(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid answer TTL: {0}")]
    InvalidTtl(String),

    #[error("Invalid answer address: {0}")]
    InvalidAnswerAddress(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Malformed upstream reply: {0}")]
    Codec(#[from] CodecError),

    #[error("Upstream reply id {got} does not match query id {expected}")]
    IdMismatch { expected: u16, got: u16 },

    #[error("Upstream sent a query instead of a response")]
    NotAResponse,

    #[error("Upstream reply does not echo the question {0}")]
    QuestionMismatch(String),

    #[error("Upstream answered {0}")]
    Upstream(ResponseCode),
}

pub type Result<T> = std::result::Result<T, CodecError>;
