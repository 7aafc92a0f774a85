//! Error types for the sync engine.

use courier_store::StoreError;
use courier_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync cycle.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Network or transport failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the next cycle may succeed.
        retryable: bool,
    },

    /// The server processed the request and said no.
    #[error("server rejected request: {0}")]
    Server(String),

    /// Malformed message or codec failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The local entity store cannot be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The local entity store rejected an operation.
    #[error("store error: {0}")]
    Store(String),

    /// A cycle is already running for this client.
    #[error("sync cycle already in progress")]
    CycleInProgress,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// True when skipping the cycle and retrying on the next tick is
    /// the right response. Queue and checkpoint are untouched in all
    /// these cases, so nothing is lost.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::StoreUnavailable(_) => true,
            SyncError::Server(_) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => SyncError::StoreUnavailable(message),
            other => SyncError::Store(other.to_string()),
        }
    }
}
