//! Transport layer abstraction for the change log.

use crate::error::{SyncError, SyncResult};
use courier_sync_protocol::{PullRequest, PullResponse, PushRequest, PushResponse};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Network seam between the sync engine and the shared change log.
///
/// Implementations must be safe under concurrent use from many clients;
/// the engine itself serializes its own calls within a cycle.
pub trait ChangeLogTransport: Send + Sync {
    /// Pushes a batch of records.
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse>;

    /// Pulls records since a timestamp.
    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse>;
}

/// A scripted transport for tests.
///
/// Responses are consumed front-to-front; a call with nothing scripted
/// is a protocol error, which keeps tests honest about how many round
/// trips a cycle makes.
#[derive(Default)]
pub struct MockTransport {
    push_responses: Mutex<VecDeque<SyncResult<PushResponse>>>,
    pull_responses: Mutex<VecDeque<SyncResult<PullResponse>>>,
    push_requests: Mutex<Vec<PushRequest>>,
    pull_requests: Mutex<Vec<PullRequest>>,
}

impl MockTransport {
    /// Creates a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next push response.
    pub fn script_push(&self, response: SyncResult<PushResponse>) {
        self.push_responses.lock().push_back(response);
    }

    /// Scripts the next pull response.
    pub fn script_pull(&self, response: SyncResult<PullResponse>) {
        self.pull_responses.lock().push_back(response);
    }

    /// Requests observed so far.
    pub fn seen_push_requests(&self) -> Vec<PushRequest> {
        self.push_requests.lock().clone()
    }

    /// Requests observed so far.
    pub fn seen_pull_requests(&self) -> Vec<PullRequest> {
        self.pull_requests.lock().clone()
    }
}

impl ChangeLogTransport for MockTransport {
    fn push(&self, request: &PushRequest) -> SyncResult<PushResponse> {
        self.push_requests.lock().push(request.clone());
        self.push_responses.lock().pop_front().unwrap_or_else(|| {
            Err(SyncError::Protocol(
                courier_sync_protocol::ProtocolError::Codec("no scripted push response".into()),
            ))
        })
    }

    fn pull(&self, request: &PullRequest) -> SyncResult<PullResponse> {
        self.pull_requests.lock().push(request.clone());
        self.pull_responses.lock().pop_front().unwrap_or_else(|| {
            Err(SyncError::Protocol(
                courier_sync_protocol::ProtocolError::Codec("no scripted pull response".into()),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn scripted_responses_are_consumed_in_order() {
        let transport = MockTransport::new();
        transport.script_pull(Ok(PullResponse::success(vec![], true)));
        transport.script_pull(Ok(PullResponse::success(vec![], false)));

        let request = PullRequest::new(Uuid::new_v4(), "tok", 0, 10);
        assert!(transport.pull(&request).unwrap().has_more);
        assert!(!transport.pull(&request).unwrap().has_more);
        assert_eq!(transport.seen_pull_requests().len(), 2);
    }

    #[test]
    fn unscripted_call_errors() {
        let transport = MockTransport::new();
        let request = PushRequest::new(Uuid::new_v4(), "tok", vec![]);
        assert!(transport.push(&request).is_err());
    }
}
