//! Client errors.

use thiserror::Error;

/// Errors returned by [`crate::ChatHandle`].
///
/// Session-level failures (sending while disconnected, malformed frames,
/// transport errors) are not surfaced here: they are reported through
/// `tracing` and reflected in the published snapshot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// The runtime task has exited.
    #[error("client runtime has stopped")]
    RuntimeStopped,
}
