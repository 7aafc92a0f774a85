//! # Courier Sync Protocol
//!
//! Change-log types and wire messages for synchronizing workspace
//! entities between independent clients.
//!
//! This crate provides:
//! - [`ChangeRecord`]: one entity mutation, the unit of synchronization
//! - the total order over records — `(timestamp, id)`, ties broken by id
//!   so every client converges on the same winner
//! - [`ChangeLog`]: the shared, append-only, totally ordered log with
//!   idempotent append and value-cursor queries
//! - push/pull request and response messages with CBOR codecs
//!
//! ## Key Invariants
//!
//! - A record in the log is never mutated or deleted
//! - Re-appending an identical record is a success no-op
//! - `query` returns records in total order and never splits a run of
//!   equal timestamps across a batch boundary

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod log;
mod messages;
mod record;

pub use error::{ProtocolError, ProtocolResult};
pub use log::{AppendOutcome, ChangeLog};
pub use messages::{from_cbor, to_cbor, PullRequest, PullResponse, PushRequest, PushResponse};
pub use record::{ChangeOperation, ChangeRecord, OrderKey};
