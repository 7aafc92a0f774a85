//! Transport failure classification.
//!
//! Classification is best-effort keyword matching over a failure's
//! message chain. That is inherently fragile across transport stacks, so
//! the keyword lists live in a replaceable [`ClassifierTable`] rather
//! than being treated as protocol truth; reqwest's structured predicates
//! are consulted before any string matching.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// The closed failure taxonomy surfaced on a proxy result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The deadline elapsed or the call was cancelled mid-flight.
    Timeout,
    /// Connection-level failure (refused, reset, unreachable).
    Network,
    /// Name resolution failed.
    Dns,
    /// Certificate or TLS handshake failure.
    Ssl,
    /// Anything unrecognized; the original message is preserved.
    Unknown,
}

impl FailureKind {
    /// The lower-case tag used on the wire and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Dns => "dns",
            FailureKind::Ssl => "ssl",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table mapping failure messages to the taxonomy.
///
/// Matching is case-insensitive substring search, dns before ssl before
/// network (the more specific categories carry more specific markers).
/// The defaults cover the hyper/rustls stack reqwest uses here; swap the
/// table when running on a different transport.
#[derive(Debug, Clone)]
pub struct ClassifierTable {
    /// Markers for name-resolution failures.
    pub dns: Vec<String>,
    /// Markers for certificate/handshake failures.
    pub ssl: Vec<String>,
    /// Markers for connection-level failures.
    pub network: Vec<String>,
}

impl Default for ClassifierTable {
    fn default() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| (*s).to_string()).collect()
        }
        Self {
            dns: list(&["dns error", "failed to lookup", "name resolution", "no such host"]),
            ssl: list(&[
                "certificate",
                "tls",
                "ssl",
                "handshake",
                "unknownissuer",
                "invalidcertificate",
            ]),
            network: list(&[
                "connection refused",
                "connection reset",
                "connection aborted",
                "broken pipe",
                "network unreachable",
                "host unreachable",
                "error trying to connect",
                "incomplete message",
            ]),
        }
    }
}

impl ClassifierTable {
    /// Classifies a bare failure message.
    ///
    /// Total: anything unmatched is [`FailureKind::Unknown`].
    pub fn classify_message(&self, message: &str) -> FailureKind {
        let haystack = message.to_ascii_lowercase();
        let hit = |needles: &[String]| needles.iter().any(|n| haystack.contains(n.as_str()));

        if hit(&self.dns) {
            FailureKind::Dns
        } else if hit(&self.ssl) {
            FailureKind::Ssl
        } else if hit(&self.network) {
            FailureKind::Network
        } else {
            FailureKind::Unknown
        }
    }

    /// Classifies a reqwest transport error.
    ///
    /// Returns the kind plus the flattened source-chain message, so the
    /// original diagnostic is never lost. Never panics.
    pub fn classify_error(&self, error: &reqwest::Error) -> (FailureKind, String) {
        let message = flatten_message(error);

        if error.is_timeout() {
            return (FailureKind::Timeout, message);
        }

        let kind = match self.classify_message(&message) {
            // A connect error with no recognizable marker is still a
            // connection-level failure.
            FailureKind::Unknown if error.is_connect() => FailureKind::Network,
            kind => kind,
        };
        (kind, message)
    }
}

/// Flattens an error and its source chain into one message.
fn flatten_message(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.dedup();
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_markers() {
        let table = ClassifierTable::default();
        assert_eq!(
            table.classify_message(
                "error trying to connect: dns error: failed to lookup address information"
            ),
            FailureKind::Dns
        );
        assert_eq!(
            table.classify_message("No such host is known"),
            FailureKind::Dns
        );
    }

    #[test]
    fn ssl_markers() {
        let table = ClassifierTable::default();
        assert_eq!(
            table.classify_message("invalid peer certificate: UnknownIssuer"),
            FailureKind::Ssl
        );
        assert_eq!(
            table.classify_message("received fatal alert: HandshakeFailure"),
            FailureKind::Ssl
        );
    }

    #[test]
    fn network_markers() {
        let table = ClassifierTable::default();
        assert_eq!(
            table.classify_message("tcp connect error: Connection refused (os error 111)"),
            FailureKind::Network
        );
        assert_eq!(
            table.classify_message("connection reset by peer"),
            FailureKind::Network
        );
    }

    #[test]
    fn unknown_preserves_nothing_matches() {
        let table = ClassifierTable::default();
        assert_eq!(
            table.classify_message("some entirely novel failure"),
            FailureKind::Unknown
        );
        assert_eq!(table.classify_message(""), FailureKind::Unknown);
    }

    #[test]
    fn dns_beats_network_when_both_match() {
        // hyper nests dns failures inside a connect error; the more
        // specific category must win.
        let table = ClassifierTable::default();
        assert_eq!(
            table.classify_message("error trying to connect: dns error"),
            FailureKind::Dns
        );
    }

    #[test]
    fn table_is_replaceable() {
        let table = ClassifierTable {
            dns: vec!["resolver exploded".into()],
            ssl: vec![],
            network: vec![],
        };
        assert_eq!(
            table.classify_message("the resolver exploded today"),
            FailureKind::Dns
        );
        // And the defaults no longer apply.
        assert_eq!(
            table.classify_message("connection refused"),
            FailureKind::Unknown
        );
    }
}
