//! Configuration for the sync server.

/// Configuration for [`crate::SyncServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret key for token signing.
    pub secret: Vec<u8>,
    /// Maximum records accepted in one push.
    pub max_push_batch: usize,
    /// Maximum records returned in one pull (the response may exceed
    /// this to keep an equal-timestamp run whole).
    pub max_pull_batch: usize,
}

impl ServerConfig {
    /// Creates a configuration with the given signing secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            max_push_batch: 500,
            max_pull_batch: 500,
        }
    }

    /// Sets the push batch limit.
    pub fn with_max_push_batch(mut self, limit: usize) -> Self {
        self.max_push_batch = limit;
        self
    }

    /// Sets the pull batch limit.
    pub fn with_max_pull_batch(mut self, limit: usize) -> Self {
        self.max_pull_batch = limit;
        self
    }
}

impl Default for ServerConfig {
    /// A development configuration with a fixed secret. Deployments
    /// must supply their own via [`ServerConfig::new`].
    fn default() -> Self {
        Self::new(b"courier-dev-secret".to_vec())
    }
}
