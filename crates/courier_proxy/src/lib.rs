//! # Courier Proxy
//!
//! Outbound proxy execution engine: performs HTTP requests on behalf of a
//! client that cannot make them directly.
//!
//! This crate provides:
//! - [`ProxyRequest`] / [`ProxyResponse`]: the boundary payloads
//! - [`TimedFetcher`]: one outbound call with a deadline and cancellation
//! - bounded body reading with a hard byte cap and a truncation flag
//! - [`ClassifierTable`]: transport failures mapped into a closed taxonomy
//! - [`ProxyEngine`]: the composed request/response cycle with timing
//!
//! ## Failure model
//!
//! Validation failures ([`ValidationError`]) reject a request before any
//! network I/O. Past validation, [`ProxyEngine::execute`] is infallible:
//! every transport failure becomes a [`ProxyResponse`] with `status == 0`
//! and a populated, classified [`ProxyFailure`]. The engine performs
//! exactly one outbound call per invocation and never retries.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod body;
mod classify;
mod config;
mod engine;
mod error;
mod fetch;
mod request;
mod response;

pub use body::{read_bounded, BoundedBody, ChunkSource};
pub use classify::{ClassifierTable, FailureKind};
pub use config::{ProxyConfig, DEFAULT_BODY_CAP, MAX_TIMEOUT_MS};
pub use engine::ProxyEngine;
pub use error::{InitError, ValidationError};
pub use fetch::{FetchError, TimedFetcher};
pub use request::{HttpMethod, ProxyRequest};
pub use response::{ProxyFailure, ProxyResponse, Timing};
