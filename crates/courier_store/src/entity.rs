//! Entity model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of entity kinds a workspace stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A named set of variables a request can reference.
    Environment,
    /// A top-level group of folders and requests.
    Collection,
    /// A nested group inside a collection (bounded nesting depth).
    Folder,
    /// A saved HTTP request description.
    Request,
}

impl EntityKind {
    /// Returns the lower-case name used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Environment => "environment",
            EntityKind::Collection => "collection",
            EntityKind::Folder => "folder",
            EntityKind::Request => "request",
        }
    }

    /// All kinds, in a stable order.
    pub fn all() -> [EntityKind; 4] {
        [
            EntityKind::Environment,
            EntityKind::Collection,
            EntityKind::Folder,
            EntityKind::Request,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environment" => Ok(EntityKind::Environment),
            "collection" => Ok(EntityKind::Collection),
            "folder" => Ok(EntityKind::Folder),
            "request" => Ok(EntityKind::Request),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// A stored entity.
///
/// The `data` field is the full snapshot of the entity as the UI layer
/// shapes it; this crate treats it as opaque. `updated_at_ms` is the
/// timestamp-like secondary key the store can scan by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Globally unique id.
    pub id: Uuid,
    /// Entity kind.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
    /// Parent entity (collections for folders/requests, folders for
    /// nested folders/requests). `None` for top-level entities.
    pub parent_id: Option<Uuid>,
    /// Full entity snapshot.
    pub data: serde_json::Value,
    /// Last modification time, Unix milliseconds.
    pub updated_at_ms: i64,
}

impl EntityRecord {
    /// Creates a new entity with a fresh id.
    pub fn new(kind: EntityKind, name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            parent_id: None,
            data,
            updated_at_ms: 0,
        }
    }

    /// Sets the parent id.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the modification time.
    pub fn with_updated_at(mut self, updated_at_ms: i64) -> Self {
        self.updated_at_ms = updated_at_ms;
        self
    }
}
