//! The proxy execution engine.

use crate::body::read_bounded;
use crate::classify::FailureKind;
use crate::config::ProxyConfig;
use crate::error::{InitError, ValidationError};
use crate::fetch::{FetchError, TimedFetcher};
use crate::request::ProxyRequest;
use crate::response::{ProxyResponse, Timing};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Executes proxy requests: one outbound call, timing instrumentation,
/// bounded body capture, classified failures.
///
/// Invocations are independent and share no mutable state; the engine
/// can be called concurrently from as many tasks as there are in-flight
/// requests without any locking.
pub struct ProxyEngine {
    fetcher: TimedFetcher,
    config: ProxyConfig,
}

impl ProxyEngine {
    /// Builds an engine from configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, InitError> {
        let fetcher = TimedFetcher::new(&config)?;
        Ok(Self { fetcher, config })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The proxy boundary: validate, then execute.
    ///
    /// A malformed request is rejected here, before any network I/O,
    /// with a [`ValidationError`] — distinct from a [`ProxyResponse`]
    /// carrying an error, which means the request did reach the network.
    pub async fn handle(&self, request: ProxyRequest) -> Result<ProxyResponse, ValidationError> {
        request.validate(&self.config)?;
        Ok(self.execute(request).await)
    }

    /// Executes a validated request. Infallible: every failure path
    /// becomes a response with `status == 0` and a classified error.
    pub async fn execute(&self, request: ProxyRequest) -> ProxyResponse {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Executes a validated request, racing an external cancellation
    /// signal against the request's own deadline. Whichever fires first
    /// aborts the call; the connection is released in both cases.
    pub async fn execute_with_cancel(
        &self,
        request: ProxyRequest,
        cancel: CancellationToken,
    ) -> ProxyResponse {
        let start = Instant::now();
        let deadline = if request.timeout_ms > 0 {
            Some(start + Duration::from_millis(request.timeout_ms))
        } else {
            None
        };

        let mut response = match self.fetcher.dispatch(&request, deadline, &cancel).await {
            Ok(response) => response,
            Err(error) => {
                // Failed before headers arrived: total time only.
                let timing = Timing {
                    total_ms: start.elapsed().as_millis() as u64,
                    first_byte_ms: None,
                    download_ms: None,
                };
                return self.failure(&request, error, timing);
            }
        };

        let first_byte = Instant::now();
        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let declared_len = response.content_length();

        let body = match read_bounded(
            &mut response,
            declared_len,
            self.config.body_cap,
            deadline,
            &cancel,
        )
        .await
        {
            Ok(body) => body,
            Err(error) => {
                let end = Instant::now();
                let timing = Timing {
                    total_ms: (end - start).as_millis() as u64,
                    first_byte_ms: Some((first_byte - start).as_millis() as u64),
                    download_ms: Some((end - first_byte).as_millis() as u64),
                };
                return self.failure(&request, error, timing);
            }
        };

        let end = Instant::now();
        let timing = Timing {
            total_ms: (end - start).as_millis() as u64,
            first_byte_ms: Some((first_byte - start).as_millis() as u64),
            download_ms: Some((end - first_byte).as_millis() as u64),
        };

        if body.truncated {
            warn!(
                url = %request.url,
                size = body.size,
                cap = self.config.body_cap,
                "response body truncated"
            );
        }
        debug!(
            url = %request.url,
            status = status.as_u16(),
            total_ms = timing.total_ms,
            "request completed"
        );

        ProxyResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: body.text(),
            body_truncated: body.truncated,
            size: body.size,
            timing,
            error: None,
        }
    }

    fn failure(&self, request: &ProxyRequest, error: FetchError, timing: Timing) -> ProxyResponse {
        let (kind, message) = match &error {
            FetchError::TimedOut => (FailureKind::Timeout, error.to_string()),
            FetchError::Transport(transport) => self.config.classifier.classify_error(transport),
        };
        debug!(
            url = %request.url,
            kind = %kind,
            total_ms = timing.total_ms,
            "request failed"
        );
        ProxyResponse::failure(kind, message, timing)
    }
}
