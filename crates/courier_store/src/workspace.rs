//! Workspace-level helpers over the entity store.
//!
//! Two operations live here rather than in the store trait because they
//! are policy, not storage:
//!
//! - the active environment is a single pointer on [`WorkspaceMeta`],
//!   not a flag duplicated across environment records, so activating one
//!   environment never touches the others
//! - folder-tree deletion walks an explicit worklist over
//!   parent→children lookups, bounded by [`MAX_FOLDER_DEPTH`]

use crate::entity::{EntityKind, EntityRecord};
use crate::error::{StoreError, StoreResult};
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Maximum folder nesting depth. A folder directly under a collection is
/// at depth 1.
pub const MAX_FOLDER_DEPTH: usize = 3;

/// Per-workspace state that is not itself a synchronized entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMeta {
    /// The currently active environment, if any.
    pub active_environment_id: Option<Uuid>,
}

impl WorkspaceMeta {
    /// Points the workspace at an environment, verifying the id refers
    /// to one.
    pub fn set_active_environment<S: EntityStore + ?Sized>(
        &mut self,
        store: &S,
        id: Uuid,
    ) -> StoreResult<()> {
        match store.get(id)? {
            Some(record) if record.kind == EntityKind::Environment => {
                self.active_environment_id = Some(id);
                Ok(())
            }
            Some(_) | None => Err(StoreError::NotFound(id)),
        }
    }

    /// Clears the active environment.
    pub fn clear_active_environment(&mut self) {
        self.active_environment_id = None;
    }

    /// Resolves the active environment record.
    ///
    /// Returns `None` when no environment is active or when the pointed-at
    /// record no longer exists (e.g. it was deleted by a pulled change).
    pub fn active_environment<S: EntityStore + ?Sized>(
        &self,
        store: &S,
    ) -> StoreResult<Option<EntityRecord>> {
        match self.active_environment_id {
            Some(id) => {
                let record = store.get(id)?;
                Ok(record.filter(|r| r.kind == EntityKind::Environment))
            }
            None => Ok(None),
        }
    }
}

/// Computes the nesting depth of a folder.
///
/// Walks parent links upward at most [`MAX_FOLDER_DEPTH`] steps; a chain
/// longer than that reports `DepthExceeded` rather than looping on a
/// corrupt parent cycle.
pub fn folder_depth<S: EntityStore + ?Sized>(store: &S, folder_id: Uuid) -> StoreResult<usize> {
    let mut depth = 0;
    let mut current = Some(folder_id);

    while let Some(id) = current {
        let record = store.get(id)?.ok_or(StoreError::NotFound(id))?;
        if record.kind != EntityKind::Folder {
            break;
        }
        depth += 1;
        if depth > MAX_FOLDER_DEPTH {
            return Err(StoreError::DepthExceeded {
                depth,
                max: MAX_FOLDER_DEPTH,
            });
        }
        current = record.parent_id;
    }

    Ok(depth)
}

/// Deletes a folder and every descendant folder and request.
///
/// This is a flat loop over a worklist: each level's children are looked
/// up and queued, level count bounded by [`MAX_FOLDER_DEPTH`], so the
/// iteration bound is known up front. Returns the number of entities
/// removed (including the folder itself). Deleting an already-absent
/// folder removes nothing and is not an error.
pub fn delete_folder_tree<S: EntityStore + ?Sized>(
    store: &S,
    folder_id: Uuid,
) -> StoreResult<usize> {
    let mut removed = 0;
    let mut level: Vec<Uuid> = vec![folder_id];

    // Levels below the root folder: descendants can sit at most
    // MAX_FOLDER_DEPTH levels deep, plus one level of requests.
    for _ in 0..=MAX_FOLDER_DEPTH {
        if level.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for id in level {
            for child in store.children_of(id)? {
                next.push(child.id);
            }
            if store.delete(id)? {
                removed += 1;
            }
        }
        level = next;
    }

    debug!(%folder_id, removed, "deleted folder tree");
    Ok(removed)
}
