//! The in-process sync server facade.

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{HandlerContext, RequestHandler};
use courier_sync_protocol::{
    from_cbor, to_cbor, ChangeLog, PullRequest, PullResponse, PushRequest, PushResponse,
};
use std::sync::Arc;
use uuid::Uuid;

/// The sync server.
///
/// Holds the shared [`ChangeLog`] and processes push/pull requests from
/// any number of clients concurrently. A deployment exposes
/// [`handle_cbor`] behind two HTTP POST endpoints; tests call the typed
/// handlers directly or bind a loopback client to [`handle_cbor`].
///
/// [`handle_cbor`]: SyncServer::handle_cbor
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SyncServer {
    /// Creates a server with a fresh, empty change log.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_log(config, Arc::new(ChangeLog::new()))
    }

    /// Creates a server over an existing change log.
    pub fn with_log(config: ServerConfig, log: Arc<ChangeLog>) -> Self {
        let context = Arc::new(HandlerContext::new(config, log));
        let handler = RequestHandler::new(Arc::clone(&context));
        Self { handler, context }
    }

    /// Issues the opaque credential for a project.
    pub fn issue_token(&self, project_id: Uuid) -> String {
        self.context.validator.issue(project_id)
    }

    /// Handles a push request.
    pub fn handle_push(&self, request: PushRequest) -> Result<PushResponse, String> {
        self.handler.handle_push(request).map_err(|e| e.to_string())
    }

    /// Handles a pull request.
    pub fn handle_pull(&self, request: PullRequest) -> Result<PullResponse, String> {
        self.handler.handle_pull(request).map_err(|e| e.to_string())
    }

    /// Dispatches a CBOR-encoded request by path.
    ///
    /// Auth and batch-limit rejections come back as *successful*
    /// decodes of an error response, so clients see a structured
    /// rejection rather than a transport failure.
    pub fn handle_cbor(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        match path {
            "/sync/push" => {
                let request: PushRequest = from_cbor(body).map_err(|e| e.to_string())?;
                let response = match self.handler.handle_push(request) {
                    Ok(response) => response,
                    Err(error) => PushResponse::error(error.to_string()),
                };
                to_cbor(&response).map_err(|e| e.to_string())
            }
            "/sync/pull" => {
                let request: PullRequest = from_cbor(body).map_err(|e| e.to_string())?;
                let response = match self.handler.handle_pull(request) {
                    Ok(response) => response,
                    Err(error) => PullResponse::error(error.to_string()),
                };
                to_cbor(&response).map_err(|e| e.to_string())
            }
            other => Err(ServerError::UnknownEndpoint(other.to_string()).to_string()),
        }
    }

    /// Records stored for a project.
    pub fn record_count(&self, project_id: Uuid) -> usize {
        self.context.log.len(project_id)
    }
}
