//! Connection manager errors.
//!
//! None of these are fatal. Each one is a report for the observability sink:
//! the manager's state is left exactly as it was before the failing call.

use chatline_proto::ProtocolError;
use thiserror::Error;

use crate::event::SocketId;

/// Errors reported by [`crate::ConnectionManager`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `send` called without an open transport or without an identity.
    #[error("cannot send while disconnected")]
    NotConnected,

    /// Inbound frame was not valid JSON or lacked required fields.
    #[error("dropped malformed frame: {0}")]
    Decode(String),

    /// Inbound frame carried a `messagetype` we do not handle.
    #[error("dropped frame with unknown type {0:?}")]
    UnknownDiscriminant(String),

    /// Outbound frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// Transport reported an error on the live socket.
    #[error("transport error on socket {socket}: {reason}")]
    Transport {
        /// Socket that reported the error.
        socket: SocketId,
        /// Error description from the transport.
        reason: String,
    },
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Decode(reason) => Self::Decode(reason),
            ProtocolError::UnknownDiscriminant(kind) => Self::UnknownDiscriminant(kind),
            ProtocolError::Encode(reason) => Self::Encode(reason),
        }
    }
}

impl SessionError {
    /// Returns true if this error concerns an inbound frame that was dropped.
    pub fn is_dropped_frame(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::UnknownDiscriminant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_map_to_session_errors() {
        let err: SessionError = ProtocolError::Decode("eof".to_string()).into();
        assert_eq!(err, SessionError::Decode("eof".to_string()));
        assert!(err.is_dropped_frame());

        let err: SessionError = ProtocolError::UnknownDiscriminant("typing".to_string()).into();
        assert_eq!(err, SessionError::UnknownDiscriminant("typing".to_string()));
        assert!(err.is_dropped_frame());

        assert!(!SessionError::NotConnected.is_dropped_frame());
        assert!(
            !SessionError::Transport { socket: SocketId::new(1), reason: "reset".to_string() }
                .is_dropped_frame()
        );
    }
}
