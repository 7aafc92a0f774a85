//! Request handling over the shared change log.

use crate::auth::TokenValidator;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use courier_sync_protocol::{
    AppendOutcome, ChangeLog, ProtocolError, PullRequest, PullResponse, PushRequest, PushResponse,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state behind the request handlers.
pub(crate) struct HandlerContext {
    pub(crate) config: ServerConfig,
    pub(crate) log: Arc<ChangeLog>,
    pub(crate) validator: TokenValidator,
}

impl HandlerContext {
    pub(crate) fn new(config: ServerConfig, log: Arc<ChangeLog>) -> Self {
        let validator = TokenValidator::new(config.secret.clone());
        Self {
            config,
            log,
            validator,
        }
    }
}

/// Processes push and pull requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    pub(crate) fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a push: append each record in batch order.
    ///
    /// Already-present records — identical re-appends and id collisions
    /// alike — are reported in `duplicates`, which pushers treat as
    /// success; the record is in the log, the retry can stop. Malformed
    /// records reject the batch.
    pub fn handle_push(&self, request: PushRequest) -> ServerResult<PushResponse> {
        self.context
            .validator
            .validate(request.project_id, &request.token)?;

        if request.records.len() > self.context.config.max_push_batch {
            return Err(ServerError::BatchTooLarge {
                got: request.records.len(),
                limit: self.context.config.max_push_batch,
            });
        }

        let mut accepted = 0u64;
        let mut duplicates = Vec::new();

        for record in request.records {
            let record_id = record.id;
            match self.context.log.append(request.project_id, record) {
                Ok(AppendOutcome::Appended) => accepted += 1,
                Ok(AppendOutcome::AlreadyPresent) => duplicates.push(record_id),
                Err(ProtocolError::DuplicateId(id)) => {
                    // Two different mutations claimed one record id.
                    // The stored record wins (append-only log); the
                    // pusher is told "already there" so it stops
                    // retrying.
                    warn!(%id, "rejected conflicting re-append, keeping stored record");
                    duplicates.push(id);
                }
                Err(other) => return Err(other.into()),
            }
        }

        debug!(
            project_id = %request.project_id,
            accepted,
            duplicates = duplicates.len(),
            "processed push"
        );
        Ok(PushResponse::success(accepted, duplicates))
    }

    /// Handles a pull: records after the client's checkpoint, in total
    /// order.
    pub fn handle_pull(&self, request: PullRequest) -> ServerResult<PullResponse> {
        self.context
            .validator
            .validate(request.project_id, &request.token)?;

        let limit = (request.limit as usize).min(self.context.config.max_pull_batch);
        let (records, has_more) =
            self.context
                .log
                .query(request.project_id, request.since_ms, limit.max(1));

        debug!(
            project_id = %request.project_id,
            since_ms = request.since_ms,
            returned = records.len(),
            has_more,
            "processed pull"
        );
        Ok(PullResponse::success(records, has_more))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_store::EntityKind;
    use courier_sync_protocol::ChangeRecord;
    use uuid::Uuid;

    fn handler() -> (RequestHandler, Uuid, String) {
        let config = ServerConfig::new(b"test-secret".to_vec());
        let context = Arc::new(HandlerContext::new(config, Arc::new(ChangeLog::new())));
        let handler = RequestHandler::new(Arc::clone(&context));

        let project = Uuid::new_v4();
        let token = context.validator.issue(project);
        (handler, project, token)
    }

    fn record(timestamp_ms: i64) -> ChangeRecord {
        ChangeRecord::create(
            EntityKind::Request,
            Uuid::new_v4(),
            serde_json::json!({"t": timestamp_ms}),
            timestamp_ms,
            "client-a",
        )
    }

    #[test]
    fn push_then_pull() {
        let (handler, project, token) = handler();

        let response = handler
            .handle_push(PushRequest::new(project, token.clone(), vec![record(1), record(2)]))
            .unwrap();
        assert!(response.success);
        assert_eq!(response.accepted, 2);
        assert!(response.duplicates.is_empty());

        let response = handler
            .handle_pull(PullRequest::new(project, token, 0, 10))
            .unwrap();
        assert_eq!(response.records.len(), 2);
        assert!(!response.has_more);
    }

    #[test]
    fn retried_push_reports_duplicates() {
        let (handler, project, token) = handler();
        let rec = record(1);
        let rec_id = rec.id;

        handler
            .handle_push(PushRequest::new(project, token.clone(), vec![rec.clone()]))
            .unwrap();
        let response = handler
            .handle_push(PushRequest::new(project, token, vec![rec]))
            .unwrap();

        assert!(response.success);
        assert_eq!(response.accepted, 0);
        assert_eq!(response.duplicates, vec![rec_id]);
    }

    #[test]
    fn bad_token_is_rejected() {
        let (handler, project, _token) = handler();

        let result = handler.handle_push(PushRequest::new(project, "forged", vec![record(1)]));
        assert!(matches!(result, Err(ServerError::InvalidToken)));

        let result = handler.handle_pull(PullRequest::new(project, "forged", 0, 10));
        assert!(matches!(result, Err(ServerError::InvalidToken)));
    }

    #[test]
    fn oversized_push_is_rejected() {
        let config = ServerConfig::new(b"test-secret".to_vec()).with_max_push_batch(2);
        let context = Arc::new(HandlerContext::new(config, Arc::new(ChangeLog::new())));
        let handler = RequestHandler::new(Arc::clone(&context));
        let project = Uuid::new_v4();
        let token = context.validator.issue(project);

        let result = handler.handle_push(PushRequest::new(
            project,
            token,
            vec![record(1), record(2), record(3)],
        ));
        assert!(matches!(result, Err(ServerError::BatchTooLarge { .. })));
    }

    #[test]
    fn pull_respects_server_batch_cap() {
        let config = ServerConfig::new(b"test-secret".to_vec()).with_max_pull_batch(2);
        let context = Arc::new(HandlerContext::new(config, Arc::new(ChangeLog::new())));
        let handler = RequestHandler::new(Arc::clone(&context));
        let project = Uuid::new_v4();
        let token = context.validator.issue(project);

        for t in 1..=5 {
            handler
                .handle_push(PushRequest::new(project, token.clone(), vec![record(t)]))
                .unwrap();
        }

        // Client asked for 100; server clamps to its own cap.
        let response = handler
            .handle_pull(PullRequest::new(project, token, 0, 100))
            .unwrap();
        assert_eq!(response.records.len(), 2);
        assert!(response.has_more);
    }
}
