//! Error types for the sync protocol.

use thiserror::Error;
use uuid::Uuid;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur handling change records and messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A record id already exists in the log with different content.
    ///
    /// An *identical* re-append is not an error (see
    /// [`crate::AppendOutcome::AlreadyPresent`]); this fires only when
    /// two different mutations claim the same record id.
    #[error("record id {0} already exists with different content")]
    DuplicateId(Uuid),

    /// A create/update record is missing its entity snapshot.
    #[error("record {0} has no data for a create/update operation")]
    MissingData(Uuid),

    /// A delete record carries an entity snapshot.
    #[error("record {0} carries data for a delete operation")]
    UnexpectedData(Uuid),

    /// CBOR encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let id = Uuid::nil();
        let err = ProtocolError::DuplicateId(id);
        assert!(err.to_string().contains("already exists"));

        let err = ProtocolError::Codec("truncated input".into());
        assert!(err.to_string().contains("truncated input"));
    }
}
