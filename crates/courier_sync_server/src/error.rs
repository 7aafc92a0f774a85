//! Error types for the sync server.

use courier_sync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors the server surfaces to its transport layer.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The presented token does not authenticate the project.
    #[error("invalid token for project")]
    InvalidToken,

    /// A batch exceeded the configured limit.
    #[error("batch of {got} records exceeds limit {limit}")]
    BatchTooLarge {
        /// Records in the request.
        got: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Protocol-level failure (codec, malformed record).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A request hit an unknown endpoint.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert!(ServerError::InvalidToken.to_string().contains("token"));
        let err = ServerError::BatchTooLarge { got: 900, limit: 500 };
        assert!(err.to_string().contains("900"));
    }
}
