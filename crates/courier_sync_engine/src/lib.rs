//! # Courier Sync Engine
//!
//! Change-log synchronization for Courier workspaces.
//!
//! This crate provides:
//! - [`OutboundQueue`]: the local append-only queue of unpushed changes
//! - [`SyncCheckpoint`]: the client-local pull cursor
//! - [`ChangeLogTransport`]: the network seam, with HTTP and loopback
//!   implementations plus a mock for tests
//! - [`SyncEngine`]: the `Idle → Pushing → Pulling → Idle` cycle with
//!   last-write-wins apply
//! - [`SyncScheduler`]: the periodic background cycle with a clean
//!   shutdown handle
//!
//! ## Key Invariants
//!
//! - One active cycle per client; push always precedes pull in a cycle
//! - Pushes are idempotent and safe to repeat: duplicates reported by
//!   the server count as success
//! - The checkpoint advances only after a pulled batch fully applies;
//!   re-applying a batch is harmless
//! - Transient failures skip the cycle and leave queue and checkpoint
//!   untouched — the next tick retries

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checkpoint;
mod config;
mod engine;
mod error;
mod http;
mod queue;
mod scheduler;
mod transport;

pub use checkpoint::SyncCheckpoint;
pub use config::SyncConfig;
pub use engine::{CycleReport, SyncEngine, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer, ReqwestClient};
pub use queue::OutboundQueue;
pub use scheduler::SyncScheduler;
pub use transport::{ChangeLogTransport, MockTransport};
