//! Proxy request payload and validation.

use crate::config::ProxyConfig;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of HTTP verbs the proxy dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET — no request body.
    Get,
    /// HEAD — no request body.
    Head,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
    /// OPTIONS.
    Options,
}

impl HttpMethod {
    /// Whether a body may be sent with this method.
    ///
    /// For GET and HEAD a supplied body is silently dropped at dispatch,
    /// never sent.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }

    /// The upper-case token.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(ValidationError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// One outbound request description.
///
/// Immutable once validated; owned by the caller for the duration of one
/// [`crate::ProxyEngine::execute`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute http(s) URL.
    pub url: String,
    /// Ordered header list. Lookup is case-insensitive, duplicates
    /// last-wins; the order is preserved on the wire.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Optional request body. Never sent for GET/HEAD.
    #[serde(default)]
    pub body: Option<String>,
    /// Deadline in milliseconds. `0` means no caller-imposed deadline.
    #[serde(default)]
    pub timeout_ms: u64,
}

impl ProxyRequest {
    /// Creates a request with no headers, no body and no deadline.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout_ms: 0,
        }
    }

    /// Appends a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the deadline in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Case-insensitive, last-wins header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Rejects malformed requests before any network I/O.
    ///
    /// Checks the URL is absolute with an http(s) scheme and the timeout
    /// is within `[0, max_timeout_ms]`. A body on GET/HEAD is not an
    /// error here; it is dropped at dispatch.
    pub fn validate(&self, config: &ProxyConfig) -> Result<(), ValidationError> {
        let url = reqwest::Url::parse(&self.url).map_err(|e| ValidationError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ValidationError::UnsupportedScheme(other.to_string()));
            }
        }
        if url.host_str().is_none() {
            return Err(ValidationError::InvalidUrl {
                url: self.url.clone(),
                reason: "missing host".into(),
            });
        }

        if self.timeout_ms > config.max_timeout_ms {
            return Err(ValidationError::TimeoutOutOfRange {
                timeout_ms: self.timeout_ms,
                max_ms: config.max_timeout_ms,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!(matches!(
            "TRACE".parse::<HttpMethod>(),
            Err(ValidationError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn body_rules() {
        assert!(!HttpMethod::Get.allows_body());
        assert!(!HttpMethod::Head.allows_body());
        assert!(HttpMethod::Post.allows_body());
        assert!(HttpMethod::Delete.allows_body());
    }

    #[test]
    fn header_lookup_is_case_insensitive_last_wins() {
        let request = ProxyRequest::new(HttpMethod::Get, "https://example.com")
            .with_header("Content-Type", "text/plain")
            .with_header("content-type", "application/json");

        assert_eq!(request.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(request.header("x-missing"), None);
        // Order is preserved for the wire.
        assert_eq!(request.headers[0].0, "Content-Type");
    }

    #[test]
    fn validate_accepts_reasonable_requests() {
        let config = ProxyConfig::default();
        let request = ProxyRequest::new(HttpMethod::Get, "https://example.com/path?q=1")
            .with_timeout_ms(5_000);
        assert!(request.validate(&config).is_ok());

        // Zero means "no deadline", an explicit choice, not an error.
        let request = ProxyRequest::new(HttpMethod::Get, "http://example.com");
        assert!(request.validate(&config).is_ok());
    }

    #[test]
    fn validate_rejects_relative_url() {
        let config = ProxyConfig::default();
        let request = ProxyRequest::new(HttpMethod::Get, "/just/a/path");
        assert!(matches!(
            request.validate(&config),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let config = ProxyConfig::default();
        let request = ProxyRequest::new(HttpMethod::Get, "ftp://example.com/file");
        assert!(matches!(
            request.validate(&config),
            Err(ValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn validate_rejects_oversized_timeout() {
        let config = ProxyConfig::default();
        let request =
            ProxyRequest::new(HttpMethod::Get, "https://example.com").with_timeout_ms(300_001);
        assert!(matches!(
            request.validate(&config),
            Err(ValidationError::TimeoutOutOfRange { .. })
        ));
    }

    #[test]
    fn request_serde_roundtrip() {
        let request = ProxyRequest::new(HttpMethod::Post, "https://example.com")
            .with_header("Authorization", "Bearer t")
            .with_body("{}")
            .with_timeout_ms(30_000);

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"POST\""));
        let back: ProxyRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
