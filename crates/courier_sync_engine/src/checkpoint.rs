//! The client-local pull cursor.

use serde::{Deserialize, Serialize};

/// Marks the last change-log timestamp this client fully applied.
///
/// Purely local state, owned exclusively by the client that advances
/// it; never shared. The zero checkpoint predates every real record,
/// so a fresh client pulls the full log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    /// Last-seen record timestamp, Unix milliseconds.
    pub last_seen_ms: i64,
}

impl SyncCheckpoint {
    /// A fresh checkpoint at the start of the log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to a later timestamp; never moves backwards.
    pub fn advance_to(&mut self, timestamp_ms: i64) {
        self.last_seen_ms = self.last_seen_ms.max(timestamp_ms);
    }
}
