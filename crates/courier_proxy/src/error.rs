//! Boundary errors for the proxy engine.

use thiserror::Error;

/// A malformed request, rejected before any network I/O.
///
/// Distinct from a [`crate::ProxyFailure`]: a validation failure means
/// the request never reached the network, so there is no timing and no
/// result to record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Method token outside the supported set.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// The URL failed to parse or is not absolute.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Only http and https are dispatchable.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// Timeout outside the accepted range.
    #[error("timeout {timeout_ms}ms outside [0, {max_ms}]ms")]
    TimeoutOutOfRange {
        /// Requested timeout.
        timeout_ms: u64,
        /// Upper bound.
        max_ms: u64,
    },
}

/// Failure to construct the engine's HTTP client.
#[derive(Error, Debug)]
#[error("failed to initialize http client: {0}")]
pub struct InitError(#[from] reqwest::Error);
