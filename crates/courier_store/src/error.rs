//! Error types for the entity store.

use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the entity store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store cannot be reached.
    ///
    /// Callers treat this as transient: the sync engine skips the cycle
    /// and retries on the next tick.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Folder nesting would exceed the enforced maximum depth.
    #[error("folder nesting depth {depth} exceeds maximum {max}")]
    DepthExceeded {
        /// The depth the operation would produce.
        depth: usize,
        /// The enforced maximum.
        max: usize,
    },

    /// An entity id referenced by an operation does not exist.
    #[error("entity not found: {0}")]
    NotFound(Uuid),
}
