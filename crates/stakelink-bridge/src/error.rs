//! Bridge error types

use stakelink_core::CodecError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Request body or addressing field could not be used
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unknown multicast group: {0}")]
    UnknownGroup(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Network server or status server call failed
    #[error("downstream failure: {0}")]
    Downstream(String),

    #[error("downstream call timed out")]
    Timeout,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// HTTP status reported to API callers
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::MalformedInput(_)
            | BridgeError::UnknownGroup(_)
            | BridgeError::Codec(_) => 400,
            BridgeError::Downstream(_)
            | BridgeError::Timeout
            | BridgeError::Config(_)
            | BridgeError::Io(_) => 500,
        }
    }
}

#[cfg(any(feature = "chirpstack", feature = "status-server"))]
impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BridgeError::Timeout
        } else {
            BridgeError::Downstream(e.to_string())
        }
    }
}
