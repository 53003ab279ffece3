//! Protocol errors.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not a well-formed frame (bad JSON, missing or mistyped
    /// fields).
    #[error("malformed frame: {0}")]
    Decode(String),

    /// Payload is well-formed but its `messagetype` is not one we know.
    #[error("unknown frame discriminant: {0:?}")]
    UnknownDiscriminant(String),

    /// Frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// Returns true if the peer sent something we could not parse at all, as
    /// opposed to a frame we parsed but do not understand.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
