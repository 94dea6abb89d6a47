use std::io;
use thiserror::Error;

/// Why a buffer could not be decoded as a protocol-10 handshake.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A read needed more bytes than the buffer (or the declared packet) holds.
    #[error("not enough data received for MySQL v10 handshake")]
    MissingData,

    #[error("MySQL handshake version {0} doesn't match expected 10")]
    InvalidProtocol(u8),
}

/// Terminal outcome of a single connect -> read -> decode attempt.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to detect MySQL during connect: {0}")]
    Connect(#[source] io::Error),

    #[error("failed to detect MySQL during read: {0}")]
    Read(#[source] io::Error),

    #[error("failed to detect MySQL during decode: not enough data received for MySQL v10 handshake")]
    MissingData,

    #[error("failed to detect MySQL during decode: handshake version {0} doesn't match expected 10")]
    InvalidProtocol(u8),
}

impl From<DecodeError> for DetectError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::MissingData => DetectError::MissingData,
            DecodeError::InvalidProtocol(v) => DetectError::InvalidProtocol(v),
        }
    }
}

impl DetectError {
    /// Short machine-friendly label, used in evidence lines and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            DetectError::Connect(_) => "connect_error",
            DetectError::Read(_) => "read_error",
            DetectError::MissingData => "missing_data",
            DetectError::InvalidProtocol(_) => "invalid_protocol",
        }
    }
}
