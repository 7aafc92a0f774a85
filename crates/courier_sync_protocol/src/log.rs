//! The shared change log.

use crate::error::{ProtocolError, ProtocolResult};
use crate::record::{ChangeRecord, OrderKey};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use uuid::Uuid;

/// Outcome of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was new and is now in the log.
    Appended,
    /// An identical record was already present; nothing was written.
    ///
    /// This is a success: a client retrying a push after a partial
    /// failure must be able to re-send records that actually landed.
    AlreadyPresent,
}

/// One project's slice of the log.
#[derive(Default)]
struct ProjectLog {
    /// Records keyed by their total-order position.
    records: BTreeMap<OrderKey, ChangeRecord>,
    /// Record id → order key, for duplicate detection.
    ids: HashMap<Uuid, OrderKey>,
}

/// The shared, append-only, totally ordered record of entity mutations.
///
/// Safe under concurrent pushes and pulls from many clients; idempotent
/// append plus the total order are what let overlapping pushes converge
/// without any cross-client coordination.
///
/// # Invariants
///
/// - Records are never mutated or deleted once appended
/// - Iteration order is the `(timestamp, id)` total order
/// - A batch never ends in the middle of an equal-timestamp run (the
///   pull cursor is a timestamp, so splitting a tie would strand the
///   unsent sibling)
pub struct ChangeLog {
    projects: RwLock<HashMap<Uuid, ProjectLog>>,
}

impl ChangeLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a record to a project's log.
    ///
    /// Fails only when the record's id already exists with *different*
    /// content; an identical re-append reports
    /// [`AppendOutcome::AlreadyPresent`] and stores nothing.
    pub fn append(&self, project_id: Uuid, record: ChangeRecord) -> ProtocolResult<AppendOutcome> {
        record.validate()?;

        let mut projects = self.projects.write();
        let project = projects.entry(project_id).or_default();

        if let Some(existing_key) = project.ids.get(&record.id) {
            let existing = &project.records[existing_key];
            return if *existing == record {
                Ok(AppendOutcome::AlreadyPresent)
            } else {
                Err(ProtocolError::DuplicateId(record.id))
            };
        }

        let key = record.order_key();
        project.ids.insert(record.id, key);
        project.records.insert(key, record);
        Ok(AppendOutcome::Appended)
    }

    /// Returns records with `timestamp_ms > since_ms` in total order.
    ///
    /// At least `limit` records are returned when available; the batch
    /// is extended past `limit` to the end of an equal-timestamp run so
    /// a timestamp cursor can always resume cleanly. The second element
    /// reports whether more records follow. The cursor is a value, not
    /// a stream handle: callers continue by re-querying from the last
    /// record's timestamp.
    pub fn query(
        &self,
        project_id: Uuid,
        since_ms: i64,
        limit: usize,
    ) -> (Vec<ChangeRecord>, bool) {
        let projects = self.projects.read();
        let Some(project) = projects.get(&project_id) else {
            return (Vec::new(), false);
        };

        let start = Bound::Excluded(OrderKey {
            timestamp_ms: since_ms,
            id: Uuid::max(),
        });
        let mut range = project.records.range((start, Bound::Unbounded));

        let mut batch: Vec<ChangeRecord> = Vec::new();
        let mut has_more = false;
        for (key, record) in &mut range {
            let past_limit = batch.len() >= limit;
            let extends_tie_run = batch
                .last()
                .is_some_and(|last| last.timestamp_ms == key.timestamp_ms);
            if past_limit && !extends_tie_run {
                has_more = true;
                break;
            }
            batch.push(record.clone());
        }

        (batch, has_more)
    }

    /// Number of records stored for a project.
    pub fn len(&self, project_id: Uuid) -> usize {
        self.projects
            .read()
            .get(&project_id)
            .map(|p| p.records.len())
            .unwrap_or(0)
    }

    /// True when the project has no records.
    pub fn is_empty(&self, project_id: Uuid) -> bool {
        self.len(project_id) == 0
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}
