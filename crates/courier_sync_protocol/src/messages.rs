//! Wire messages for push and pull, with CBOR codecs.

use crate::error::{ProtocolError, ProtocolResult};
use crate::record::ChangeRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Encodes a message to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| ProtocolError::Codec(e.to_string()))?;
    Ok(buf)
}

/// Decodes a message from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> ProtocolResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::Codec(e.to_string()))
}

/// Push a batch of change records into a project's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Target project.
    pub project_id: Uuid,
    /// Opaque per-project credential.
    pub token: String,
    /// Records in the client's queue order.
    pub records: Vec<ChangeRecord>,
}

impl PushRequest {
    /// Creates a push request.
    pub fn new(project_id: Uuid, token: impl Into<String>, records: Vec<ChangeRecord>) -> Self {
        Self {
            project_id,
            token: token.into(),
            records,
        }
    }
}

/// Server's answer to a push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResponse {
    /// Whether the push was processed.
    pub success: bool,
    /// Error message when not.
    pub error: Option<String>,
    /// Records newly appended.
    pub accepted: u64,
    /// Ids that were already present (count as success for the pusher:
    /// a retried record that actually landed earlier).
    pub duplicates: Vec<Uuid>,
}

impl PushResponse {
    /// A processed push.
    pub fn success(accepted: u64, duplicates: Vec<Uuid>) -> Self {
        Self {
            success: true,
            error: None,
            accepted,
            duplicates,
        }
    }

    /// A rejected push.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            accepted: 0,
            duplicates: Vec::new(),
        }
    }
}

/// Pull records with `timestamp_ms > since_ms` for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Target project.
    pub project_id: Uuid,
    /// Opaque per-project credential.
    pub token: String,
    /// Client checkpoint: last-seen timestamp.
    pub since_ms: i64,
    /// Batch size hint. The server may return more to avoid splitting
    /// an equal-timestamp run.
    pub limit: u32,
}

impl PullRequest {
    /// Creates a pull request.
    pub fn new(project_id: Uuid, token: impl Into<String>, since_ms: i64, limit: u32) -> Self {
        Self {
            project_id,
            token: token.into(),
            since_ms,
            limit,
        }
    }
}

/// Server's answer to a pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullResponse {
    /// Whether the pull was processed.
    pub success: bool,
    /// Error message when not.
    pub error: Option<String>,
    /// Records in total order.
    pub records: Vec<ChangeRecord>,
    /// Whether more records follow the batch.
    pub has_more: bool,
}

impl PullResponse {
    /// A processed pull.
    pub fn success(records: Vec<ChangeRecord>, has_more: bool) -> Self {
        Self {
            success: true,
            error: None,
            records,
            has_more,
        }
    }

    /// A rejected pull.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            records: Vec::new(),
            has_more: false,
        }
    }
}
