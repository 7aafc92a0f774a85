//! The timed fetcher: one outbound call under a deadline.

use crate::config::ProxyConfig;
use crate::error::InitError;
use crate::request::ProxyRequest;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Failures a fetch (or a subsequent bounded body read) can produce.
///
/// Deadline expiry and external cancellation are deliberately one
/// variant: at this layer they are indistinguishable — both abort the
/// in-flight call and release the connection.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The transport failed.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The deadline elapsed or the caller cancelled mid-flight.
    #[error("request timed out or was cancelled")]
    TimedOut,
}

/// Issues exactly one outbound HTTP call per [`dispatch`] invocation.
///
/// Redirects are not followed: following one would turn a single-shot
/// call into several, and the caller is owed the response the origin
/// actually sent.
///
/// [`dispatch`]: TimedFetcher::dispatch
pub struct TimedFetcher {
    client: reqwest::Client,
}

impl TimedFetcher {
    /// Builds the fetcher and its underlying client.
    pub fn new(config: &ProxyConfig) -> Result<Self, InitError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Dispatches the request, racing the optional deadline and the
    /// cancellation token against the in-flight call.
    ///
    /// Whichever fires first wins; dropping the in-flight future aborts
    /// the request and releases the connection. A supplied body is
    /// dropped for GET/HEAD, never sent.
    pub async fn dispatch(
        &self,
        request: &ProxyRequest,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, FetchError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if request.method.allows_body() {
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }
        }

        debug!(method = %request.method, url = %request.url, "dispatching");

        let in_flight = builder.send();
        let response = match deadline {
            Some(deadline) => tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::TimedOut),
                result = tokio::time::timeout_at(deadline, in_flight) => {
                    result.map_err(|_| FetchError::TimedOut)??
                }
            },
            None => tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::TimedOut),
                result = in_flight => result?,
            },
        };

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    /// A local listener that accepts, reads the request and never
    /// answers, so the in-flight call hangs until aborted.
    async fn silent_server() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8 * 1024];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn cancellation_wins_without_deadline() {
        let fetcher = TimedFetcher::new(&ProxyConfig::default()).unwrap();
        let addr = silent_server().await;
        let request = ProxyRequest::new(HttpMethod::Get, format!("http://{addr}/"));

        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            child.cancel();
        });

        let started = std::time::Instant::now();
        let result = fetcher.dispatch(&request, None, &cancel).await;
        assert!(matches!(result, Err(FetchError::TimedOut)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn deadline_fires() {
        let fetcher = TimedFetcher::new(&ProxyConfig::default()).unwrap();
        let addr = silent_server().await;
        let request = ProxyRequest::new(HttpMethod::Get, format!("http://{addr}/"));

        let deadline = Instant::now() + Duration::from_millis(50);
        let result = fetcher
            .dispatch(&request, Some(deadline), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(FetchError::TimedOut)));
    }
}
