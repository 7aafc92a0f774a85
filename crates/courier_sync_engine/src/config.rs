//! Configuration for the sync engine.

use std::time::Duration;
use uuid::Uuid;

/// Configuration for one client's sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// The synchronized project (workspace).
    pub project_id: Uuid,
    /// Opaque id of this client, stamped onto produced records.
    pub client_id: String,
    /// Opaque per-project credential presented on every request.
    pub token: String,
    /// Sync server base URL.
    pub server_url: String,
    /// Records per push request.
    pub push_batch_size: u32,
    /// Records per pull request (the server may send more to keep an
    /// equal-timestamp run whole).
    pub pull_batch_size: u32,
    /// Interval between scheduled cycles.
    pub interval: Duration,
}

impl SyncConfig {
    /// Creates a configuration with default batch sizes and interval.
    pub fn new(
        project_id: Uuid,
        client_id: impl Into<String>,
        token: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            client_id: client_id.into(),
            token: token.into(),
            server_url: server_url.into(),
            push_batch_size: 100,
            pull_batch_size: 100,
            interval: Duration::from_secs(30),
        }
    }

    /// Sets the push batch size.
    pub fn with_push_batch_size(mut self, size: u32) -> Self {
        self.push_batch_size = size;
        self
    }

    /// Sets the pull batch size.
    pub fn with_pull_batch_size(mut self, size: u32) -> Self {
        self.pull_batch_size = size;
        self
    }

    /// Sets the scheduled cycle interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
