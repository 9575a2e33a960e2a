//! Error types for field codecs and catalog lookups

use thiserror::Error;

/// Errors raised by the field encode/decode transforms
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value contains non-ASCII characters
    #[error("ASCII field cannot encode the given value")]
    NotAscii,

    /// Encoded value would not fit in the field
    #[error("value too long ({len} bytes) for field (max {max})")]
    ValueTooLong { len: usize, max: usize },

    /// UUID text form could not be parsed
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// UUID fields are exactly 16 bytes; any other length is a hard error
    #[error("UUID field must be 16 bytes, not {0}")]
    UuidLength(usize),

    /// A byte token was not a valid 0-255 value
    #[error("byte '{0}' out of range (0-255)")]
    InvalidByteToken(String),

    /// Wrong number of byte tokens for the field width
    #[error("expected {expected} byte(s) but got {got}")]
    ByteCount { expected: usize, got: usize },

    /// Value contained no byte tokens at all
    #[error("value must contain at least one byte")]
    Empty,

    /// Wrong number of decimal digits for a BCD date field
    #[error("expected {expected} digits but got {got}")]
    DigitCount { expected: usize, got: usize },

    /// A stored byte holds a nibble greater than 9
    #[error("invalid BCD digit in 0x{0:02X}")]
    InvalidBcd(u8),

    /// Decode was handed a buffer that does not match the field length
    #[error("buffer is {got} byte(s), field expects {expected}")]
    BufferLength { expected: usize, got: usize },
}

/// Higher-level field/command lookup errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Field name not present in the catalog
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Command byte outside the known command space
    #[error("unknown command: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Codec transform rejected the value or buffer
    #[error(transparent)]
    Codec(#[from] CodecError),
}
