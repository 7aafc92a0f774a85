//! # Courier Sync Server
//!
//! Reference server hosting the shared change log behind per-project
//! token auth.
//!
//! Like the engine's transport, the server is an in-process handler: a
//! deployment wraps [`SyncServer::handle_cbor`] (or the typed
//! `handle_push` / `handle_pull`) in whatever HTTP framework it already
//! runs. Tests bind the engine's loopback client straight to it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod handler;
mod server;

pub use auth::TokenValidator;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use server::SyncServer;
