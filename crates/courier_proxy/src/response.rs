//! Proxy result payload.

use crate::classify::FailureKind;
use serde::{Deserialize, Serialize};

/// Timing captured around one proxy call, in milliseconds.
///
/// `total_ms` is always present; `first_byte_ms` and `download_ms` exist
/// only when response headers actually arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Start to finish.
    pub total_ms: u64,
    /// Start to first byte of the response.
    pub first_byte_ms: Option<u64>,
    /// First byte to finish.
    pub download_ms: Option<u64>,
}

/// A classified transport failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyFailure {
    /// Taxonomy member.
    #[serde(rename = "type")]
    pub kind: FailureKind,
    /// Human-readable message, original diagnostic preserved.
    pub message: String,
}

/// The outcome of one proxy call.
///
/// Created once per call and never mutated; handed to the caller and to
/// the history log.
///
/// # Invariants
///
/// - `error.is_some()` iff `status == 0`
/// - `body_truncated` implies exactly `cap` captured body bytes
/// - `size` is the true byte count, never reduced by truncation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyResponse {
    /// HTTP status; `0` when no status was ever received.
    pub status: u16,
    /// Canonical reason phrase, empty when unknown.
    pub status_text: String,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body decoded as text (lossy), possibly truncated.
    pub body: String,
    /// Whether the body was cut at the capture cap.
    pub body_truncated: bool,
    /// Declared-or-observed body byte count, uncapped.
    pub size: u64,
    /// Timing breakdown.
    pub timing: Timing,
    /// Present exactly when the call produced no usable response.
    pub error: Option<ProxyFailure>,
}

impl ProxyResponse {
    /// Builds the terminal-failure shape: `status = 0`, empty
    /// headers/body, classified error, whatever timing was captured.
    pub fn failure(kind: FailureKind, message: impl Into<String>, timing: Timing) -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: Vec::new(),
            body: String::new(),
            body_truncated: false,
            size: 0,
            timing,
            error: Some(ProxyFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    /// True when the call failed before producing a usable response.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
