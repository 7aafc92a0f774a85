//! # Courier Store
//!
//! Entity model and saved-entity store for Courier.
//!
//! This crate provides:
//! - The typed entity model (environments, collections, folders, requests)
//! - The [`EntityStore`] trait: point lookups by id plus the secondary-key
//!   queries the sync layer needs (by kind, by parent, by update time)
//! - An in-memory reference implementation
//! - Workspace-level helpers: the active-environment pointer and bounded
//!   folder-tree deletion
//!
//! The storage engine behind a production store (SQLite, IndexedDB, ...)
//! is intentionally not specified here; anything that can satisfy
//! [`EntityStore`] plugs into the sync engine unchanged.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod store;
mod workspace;

pub use entity::{EntityKind, EntityRecord};
pub use error::{StoreError, StoreResult};
pub use store::{EntityStore, MemoryStore};
pub use workspace::{
    delete_folder_tree, folder_depth, WorkspaceMeta, MAX_FOLDER_DEPTH,
};
