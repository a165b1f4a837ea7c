//!
//! # Gdsio Errors
//!

use thiserror::Error;

use crate::data::{GdsDataType, GdsRecord, GdsRecordType};

/// # Gds Context
/// Enumeration of each context in which a record can be parsed, primarily for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdsContext {
    Library,
    Struct,
    StructRef,
    ArrayRef,
    Element,
    Property,
}

/// # GdsResult Type-Alias
pub type GdsResult<T> = Result<T, GdsError>;

/// # Gds Error Enumeration
/// Most errors are tied in some sense to parsing and decoding.
/// Once a valid [crate::GdsLibrary] is created in memory, it can generally be streamed to bytes.
#[derive(Debug, Error)]
pub enum GdsError {
    /// Invalid binary -> record conversion
    #[error("cannot decode {0:?} record with {1:?} data of length {2}")]
    RecordDecode(GdsRecordType, GdsDataType, u16),
    /// Invalid record length
    #[error("invalid record length {0}")]
    RecordLen(usize),
    /// Invalid data type
    #[error("invalid data type {0:#04x}")]
    InvalidDataType(u8),
    /// Invalid record type
    #[error("invalid record type {0:#04x}")]
    InvalidRecordType(u8),
    /// Parser Errors
    #[error("{msg}: record #{recordnum} {record:?} at byte {bytepos}, in {ctx:?}")]
    Parse {
        msg: String,
        record: GdsRecord,
        recordnum: usize,
        bytepos: u64,
        ctx: Vec<GdsContext>,
    },
    /// File and stream errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Non-UTF8 string content
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
    /// Other errors
    #[error("{0}")]
    Str(String),
}
impl From<String> for GdsError {
    fn from(e: String) -> Self {
        GdsError::Str(e)
    }
}
impl From<&str> for GdsError {
    fn from(e: &str) -> Self {
        GdsError::Str(e.to_string())
    }
}
