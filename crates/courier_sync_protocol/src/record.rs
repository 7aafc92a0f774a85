//! Change records and their total order.

use crate::error::{ProtocolError, ProtocolResult};
use courier_store::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    /// Entity was created. Carries the full snapshot.
    Create,
    /// Entity was updated. Carries the full snapshot.
    Update,
    /// Entity was deleted. Carries no snapshot.
    Delete,
}

impl ChangeOperation {
    /// Whether this operation must carry an entity snapshot.
    pub fn requires_data(&self) -> bool {
        !matches!(self, ChangeOperation::Delete)
    }
}

/// The total-order key for conflict resolution: `(timestamp, id)`.
///
/// Timestamps order records; ties are broken deterministically by id
/// bytes, so every client that sees both records picks the same winner.
/// The derived `Ord` is exactly that lexicographic comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderKey {
    /// Record timestamp, Unix milliseconds. Used only for ordering and
    /// tie-breaking, not as a clock-accuracy guarantee.
    pub timestamp_ms: i64,
    /// Record id.
    pub id: Uuid,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.timestamp_ms, self.id)
    }
}

/// One entity mutation, the unit of synchronization.
///
/// Produced by exactly one client; once appended to the shared log it is
/// owned by the log and never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Globally unique record id.
    pub id: Uuid,
    /// Kind of the mutated entity.
    pub entity_kind: EntityKind,
    /// The mutated entity's identity.
    pub entity_id: Uuid,
    /// The mutation.
    pub operation: ChangeOperation,
    /// Full entity snapshot for create/update; absent for delete.
    pub data: Option<serde_json::Value>,
    /// Logical timestamp, Unix milliseconds.
    pub timestamp_ms: i64,
    /// Opaque id of the writing client.
    pub origin_client: String,
}

impl ChangeRecord {
    /// Creates a `Create` record.
    pub fn create(
        entity_kind: EntityKind,
        entity_id: Uuid,
        data: serde_json::Value,
        timestamp_ms: i64,
        origin_client: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_kind,
            entity_id,
            operation: ChangeOperation::Create,
            data: Some(data),
            timestamp_ms,
            origin_client: origin_client.into(),
        }
    }

    /// Creates an `Update` record.
    pub fn update(
        entity_kind: EntityKind,
        entity_id: Uuid,
        data: serde_json::Value,
        timestamp_ms: i64,
        origin_client: impl Into<String>,
    ) -> Self {
        Self {
            operation: ChangeOperation::Update,
            ..Self::create(entity_kind, entity_id, data, timestamp_ms, origin_client)
        }
    }

    /// Creates a `Delete` record.
    pub fn delete(
        entity_kind: EntityKind,
        entity_id: Uuid,
        timestamp_ms: i64,
        origin_client: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_kind,
            entity_id,
            operation: ChangeOperation::Delete,
            data: None,
            timestamp_ms,
            origin_client: origin_client.into(),
        }
    }

    /// The record's position in the total order.
    pub fn order_key(&self) -> OrderKey {
        OrderKey {
            timestamp_ms: self.timestamp_ms,
            id: self.id,
        }
    }

    /// Checks the snapshot-presence rule for the operation.
    pub fn validate(&self) -> ProtocolResult<()> {
        match (self.operation.requires_data(), self.data.is_some()) {
            (true, false) => Err(ProtocolError::MissingData(self.id)),
            (false, true) => Err(ProtocolError::UnexpectedData(self.id)),
            _ => Ok(()),
        }
    }
}
