//! Configuration for the proxy engine.

use crate::classify::ClassifierTable;
use std::time::Duration;

/// Hard cap on captured response body bytes: 10 MiB.
pub const DEFAULT_BODY_CAP: usize = 10 * 1024 * 1024;

/// Upper bound on a caller-supplied timeout: 5 minutes.
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Configuration for [`crate::ProxyEngine`].
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Body capture cap in bytes.
    pub body_cap: usize,
    /// Maximum accepted `timeout_ms` on a request.
    pub max_timeout_ms: u64,
    /// TCP connect timeout. Separate from the per-request deadline; a
    /// request with `timeout_ms == 0` still gives up on a dead TCP
    /// handshake eventually.
    pub connect_timeout: Duration,
    /// Failure classification table.
    pub classifier: ClassifierTable,
    /// `User-Agent` sent when the caller supplies none.
    pub user_agent: String,
}

impl ProxyConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            body_cap: DEFAULT_BODY_CAP,
            max_timeout_ms: MAX_TIMEOUT_MS,
            connect_timeout: Duration::from_secs(30),
            classifier: ClassifierTable::default(),
            user_agent: concat!("courier/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Sets the body capture cap.
    pub fn with_body_cap(mut self, cap: usize) -> Self {
        self.body_cap = cap;
        self
    }

    /// Sets the maximum accepted request timeout.
    pub fn with_max_timeout_ms(mut self, max_ms: u64) -> Self {
        self.max_timeout_ms = max_ms;
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replaces the classifier table.
    pub fn with_classifier(mut self, classifier: ClassifierTable) -> Self {
        self.classifier = classifier;
        self
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::new()
    }
}
