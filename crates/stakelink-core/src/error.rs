//! Codec error types

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Frequency outside {30, 60, 120}
    #[error("unsupported frequency: {0} Hz (expected 30, 60 or 120)")]
    InvalidFrequency(u16),

    /// Level outside {500, 1000, 2000, 4000, 7000}
    #[error("unsupported level: {0} (expected 500, 1000, 2000, 4000 or 7000)")]
    InvalidLevel(u16),

    /// Flag other than 0 or 1
    #[error("flag must be 0 or 1, got {0}")]
    InvalidFlag(u8),

    /// Hex field with wrong length or non-hex characters
    #[error("invalid {field}: expected {expected} hex characters")]
    InvalidHex {
        field: &'static str,
        expected: usize,
    },

    /// Uplink data field is not valid base64
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// Uplink payload has no command byte
    #[error("empty uplink payload")]
    EmptyPayload,

    /// Payload shorter than the command requires
    #[error("payload too short: need {needed} bytes, have {have}")]
    ShortPayload { needed: usize, have: usize },
}

impl From<base64::DecodeError> for CodecError {
    fn from(e: base64::DecodeError) -> Self {
        CodecError::InvalidBase64(e.to_string())
    }
}
