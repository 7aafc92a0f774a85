//! The saved-entity store.

use crate::entity::{EntityKind, EntityRecord};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// Point lookups and secondary-key queries over saved entities.
///
/// This is the seam between the sync layer and whatever persistence the
/// host application provides. Implementations must be safe to share
/// across threads; the sync engine holds one behind an `Arc`.
///
/// # Invariants
///
/// - `put` overwrites unconditionally (last write wins at this layer)
/// - `delete` is idempotent and reports whether anything was removed
/// - ordered queries sort by `(updated_at_ms, id)` ascending
pub trait EntityStore: Send + Sync {
    /// Gets an entity by id.
    fn get(&self, id: Uuid) -> StoreResult<Option<EntityRecord>>;

    /// Inserts or overwrites an entity.
    fn put(&self, record: EntityRecord) -> StoreResult<()>;

    /// Deletes an entity if present. Returns true if it existed.
    fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Returns all entities of a kind, ordered by `(updated_at_ms, id)`.
    fn list_kind(&self, kind: EntityKind) -> StoreResult<Vec<EntityRecord>>;

    /// Returns the direct children of an entity, ordered by
    /// `(updated_at_ms, id)`.
    fn children_of(&self, parent_id: Uuid) -> StoreResult<Vec<EntityRecord>>;

    /// Ordered scan of entities with `updated_at_ms > since_ms`.
    fn updated_since(&self, since_ms: i64) -> StoreResult<Vec<EntityRecord>>;
}

/// In-memory entity store.
///
/// The reference implementation used by tests and the sync engine's
/// examples. `set_available(false)` simulates an unreachable backing
/// store so callers can exercise their degraded paths.
pub struct MemoryStore {
    entities: RwLock<HashMap<Uuid, EntityRecord>>,
    available: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggles simulated availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store marked offline".into()))
        }
    }

    fn sorted(mut records: Vec<EntityRecord>) -> Vec<EntityRecord> {
        records.sort_by_key(|r| (r.updated_at_ms, r.id));
        records
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, id: Uuid) -> StoreResult<Option<EntityRecord>> {
        self.check_available()?;
        Ok(self.entities.read().get(&id).cloned())
    }

    fn put(&self, record: EntityRecord) -> StoreResult<()> {
        self.check_available()?;
        self.entities.write().insert(record.id, record);
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.entities.write().remove(&id).is_some())
    }

    fn list_kind(&self, kind: EntityKind) -> StoreResult<Vec<EntityRecord>> {
        self.check_available()?;
        let records = self
            .entities
            .read()
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }

    fn children_of(&self, parent_id: Uuid) -> StoreResult<Vec<EntityRecord>> {
        self.check_available()?;
        let records = self
            .entities
            .read()
            .values()
            .filter(|r| r.parent_id == Some(parent_id))
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }

    fn updated_since(&self, since_ms: i64) -> StoreResult<Vec<EntityRecord>> {
        self.check_available()?;
        let records = self
            .entities
            .read()
            .values()
            .filter(|r| r.updated_at_ms > since_ms)
            .cloned()
            .collect();
        Ok(Self::sorted(records))
    }
}
