//! The sync engine state machine.

use crate::checkpoint::SyncCheckpoint;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::queue::OutboundQueue;
use crate::transport::ChangeLogTransport;
use courier_store::{EntityRecord, EntityStore};
use courier_sync_protocol::{
    ChangeOperation, ChangeRecord, OrderKey, PullRequest, PushRequest,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where the engine is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Between cycles.
    Idle,
    /// Draining the outbound queue to the server.
    Pushing,
    /// Applying pulled records to the local store.
    Pulling,
}

impl SyncState {
    /// True while a cycle is running.
    pub fn is_active(&self) -> bool {
        !matches!(self, SyncState::Idle)
    }
}

/// Counters across the engine's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Cycles that ran to completion.
    pub cycles_completed: u64,
    /// Cycles abandoned on a transient failure, to be retried.
    pub cycles_skipped: u64,
    /// Records the server accepted (duplicates included).
    pub records_pushed: u64,
    /// Records applied from pulls.
    pub records_pulled: u64,
    /// Pulled records discarded because a newer edit of the same
    /// entity had already been applied (the losing side of
    /// last-write-wins).
    pub records_discarded: u64,
    /// Most recent cycle failure, if any.
    pub last_error: Option<String>,
}

/// What one completed cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Records pushed (accepted or already present).
    pub pushed: u64,
    /// Records pulled and walked through apply.
    pub pulled: u64,
}

/// One client's sync engine: `Idle → Pushing → Pulling → Idle`.
///
/// A single cycle runs at a time per engine ([`run_cycle`] refuses
/// reentry), which keeps checkpoint advancement deterministic. Multiple
/// clients each run their own engine against the shared log with no
/// coordination: idempotent append, the total order and last-write-wins
/// apply are what make concurrent cycles converge.
///
/// [`run_cycle`]: SyncEngine::run_cycle
pub struct SyncEngine<T: ChangeLogTransport> {
    config: SyncConfig,
    transport: Arc<T>,
    store: Arc<dyn EntityStore>,
    queue: Arc<OutboundQueue>,
    checkpoint: RwLock<SyncCheckpoint>,
    /// Per-entity high-water mark of applied `(timestamp, id)` keys.
    /// Makes apply idempotent and blocks regression if records ever
    /// arrive out of contract order. Engine-local and safe to lose:
    /// re-applying is harmless.
    applied: RwLock<HashMap<Uuid, OrderKey>>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<T: ChangeLogTransport> SyncEngine<T> {
    /// Creates an engine over a transport, store and outbound queue.
    pub fn new(
        config: SyncConfig,
        transport: T,
        store: Arc<dyn EntityStore>,
        queue: Arc<OutboundQueue>,
    ) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            store,
            queue,
            checkpoint: RwLock::new(SyncCheckpoint::new()),
            applied: RwLock::new(HashMap::new()),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Current cycle state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Current pull cursor.
    pub fn checkpoint(&self) -> SyncCheckpoint {
        *self.checkpoint.read()
    }

    /// Restores a persisted pull cursor (call before the first cycle).
    pub fn restore_checkpoint(&self, checkpoint: SyncCheckpoint) {
        *self.checkpoint.write() = checkpoint;
    }

    /// Runs one push-then-pull cycle.
    ///
    /// On a transient failure the cycle is abandoned with queue and
    /// checkpoint untouched; the caller (normally the scheduler) just
    /// waits for the next tick. Nothing is lost either way.
    pub fn run_cycle(&self) -> SyncResult<CycleReport> {
        {
            let mut state = self.state.write();
            if state.is_active() {
                return Err(SyncError::CycleInProgress);
            }
            *state = SyncState::Pushing;
        }

        let result = self.push_phase().and_then(|pushed| {
            *self.state.write() = SyncState::Pulling;
            self.pull_phase().map(|pulled| CycleReport { pushed, pulled })
        });

        *self.state.write() = SyncState::Idle;

        let mut stats = self.stats.write();
        match &result {
            Ok(report) => {
                stats.cycles_completed += 1;
                stats.records_pushed += report.pushed;
                stats.records_pulled += report.pulled;
                stats.last_error = None;
                debug!(
                    pushed = report.pushed,
                    pulled = report.pulled,
                    "sync cycle completed"
                );
            }
            Err(error) => {
                stats.cycles_skipped += 1;
                stats.last_error = Some(error.to_string());
                warn!(%error, transient = error.is_transient(), "sync cycle abandoned");
            }
        }

        result
    }

    /// Drains the outbound queue in order, batch by batch.
    ///
    /// Server-reported duplicates count as success: the record landed
    /// on an earlier push whose response we never saw. Any failure
    /// leaves the unpushed remainder in the queue for the next cycle.
    fn push_phase(&self) -> SyncResult<u64> {
        let mut total = 0u64;

        loop {
            let batch = self.queue.peek_batch(self.config.push_batch_size as usize);
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();

            let request = PushRequest::new(
                self.config.project_id,
                self.config.token.clone(),
                batch,
            );
            let response = self.transport.push(&request)?;
            if !response.success {
                return Err(SyncError::Server(
                    response.error.unwrap_or_else(|| "push rejected".into()),
                ));
            }

            // Accepted and already-present records are both done.
            self.queue.commit_front(batch_len);
            total += batch_len as u64;

            if !response.duplicates.is_empty() {
                debug!(
                    duplicates = response.duplicates.len(),
                    "server already had some pushed records"
                );
            }
        }

        Ok(total)
    }

    /// Pulls and applies batches until the log is drained.
    ///
    /// The checkpoint advances to the last record's timestamp only
    /// after a batch fully applies; a failure mid-batch leaves it
    /// where it was, so the batch is re-pulled and re-applied — which
    /// is safe, because apply is idempotent.
    fn pull_phase(&self) -> SyncResult<u64> {
        let mut total = 0u64;

        // Start one tick before the checkpoint: a record appended later
        // with a timestamp equal to the checkpoint would otherwise never
        // be pulled (the query is strictly `timestamp > since`). The
        // re-delivered run is discarded by the applied guard.
        let mut since = self.checkpoint.read().last_seen_ms.saturating_sub(1);

        loop {
            let request = PullRequest::new(
                self.config.project_id,
                self.config.token.clone(),
                since,
                self.config.pull_batch_size,
            );
            let response = self.transport.pull(&request)?;
            if !response.success {
                return Err(SyncError::Server(
                    response.error.unwrap_or_else(|| "pull rejected".into()),
                ));
            }
            if response.records.is_empty() {
                break;
            }

            let last_ts = response
                .records
                .last()
                .map(|r| r.timestamp_ms)
                .unwrap_or(since);
            for record in &response.records {
                self.apply_record(record)?;
            }
            total += response.records.len() as u64;
            self.checkpoint.write().advance_to(last_ts);
            since = last_ts;

            if !response.has_more {
                break;
            }
        }

        Ok(total)
    }

    /// Applies one pulled record to the local store.
    ///
    /// Create and update overwrite unconditionally; delete removes if
    /// present. A record at or below the entity's applied high-water
    /// mark is discarded — it already lost by the total order.
    fn apply_record(&self, record: &ChangeRecord) -> SyncResult<()> {
        record.validate()?;

        let key = record.order_key();
        if let Some(seen) = self.applied.read().get(&record.entity_id) {
            if key <= *seen {
                self.stats.write().records_discarded += 1;
                debug!(
                    entity_id = %record.entity_id,
                    record_id = %record.id,
                    "discarding stale pulled record"
                );
                return Ok(());
            }
        }

        match record.operation {
            ChangeOperation::Create | ChangeOperation::Update => {
                self.store.put(entity_from_record(record))?;
            }
            ChangeOperation::Delete => {
                self.store.delete(record.entity_id)?;
            }
        }

        self.applied.write().insert(record.entity_id, key);
        Ok(())
    }
}

/// Rebuilds a store row from a pulled snapshot.
fn entity_from_record(record: &ChangeRecord) -> EntityRecord {
    // validate() ran before this; a create/update always has data.
    let data = record.data.clone().unwrap_or_default();
    let name = data
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let parent_id = data
        .get("parent_id")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok());

    EntityRecord {
        id: record.entity_id,
        kind: record.entity_kind,
        name,
        parent_id,
        data,
        updated_at_ms: record.timestamp_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use courier_store::{EntityKind, MemoryStore};
    use courier_sync_protocol::{PullResponse, PushResponse};
    use std::sync::mpsc;

    fn config() -> SyncConfig {
        SyncConfig::new(Uuid::new_v4(), "client-a", "tok", "memory://")
    }

    fn setup() -> (Arc<MemoryStore>, Arc<OutboundQueue>, MockTransport) {
        (
            Arc::new(MemoryStore::new()),
            Arc::new(OutboundQueue::new()),
            MockTransport::new(),
        )
    }

    fn change(entity_id: Uuid, timestamp_ms: i64, label: &str) -> ChangeRecord {
        ChangeRecord::update(
            EntityKind::Request,
            entity_id,
            serde_json::json!({"name": label}),
            timestamp_ms,
            "other-client",
        )
    }

    #[test]
    fn engine_starts_idle() {
        let (store, queue, transport) = setup();
        let engine = SyncEngine::new(config(), transport, store, queue);

        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().cycles_completed, 0);
        assert_eq!(engine.checkpoint().last_seen_ms, 0);
    }

    #[test]
    fn empty_cycle_pulls_nothing_and_pushes_nothing() {
        let (store, queue, transport) = setup();
        transport.script_pull(Ok(PullResponse::success(vec![], false)));

        let engine = SyncEngine::new(config(), transport, store, queue);
        let report = engine.run_cycle().unwrap();

        assert_eq!(report.pushed, 0);
        assert_eq!(report.pulled, 0);
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().cycles_completed, 1);
    }

    #[test]
    fn push_drains_queue_on_success() {
        let (store, queue, transport) = setup();
        queue.enqueue(change(Uuid::new_v4(), 1, "a"));
        queue.enqueue(change(Uuid::new_v4(), 2, "b"));
        transport.script_push(Ok(PushResponse::success(2, vec![])));
        transport.script_pull(Ok(PullResponse::success(vec![], false)));

        let engine = SyncEngine::new(config(), transport, Arc::clone(&store) as Arc<dyn EntityStore>, Arc::clone(&queue));
        let report = engine.run_cycle().unwrap();

        assert_eq!(report.pushed, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_response_still_drains_queue() {
        let (store, queue, transport) = setup();
        let record = change(Uuid::new_v4(), 1, "a");
        let record_id = record.id;
        queue.enqueue(record);
        transport.script_push(Ok(PushResponse::success(0, vec![record_id])));
        transport.script_pull(Ok(PullResponse::success(vec![], false)));

        let engine = SyncEngine::new(config(), transport, store, Arc::clone(&queue));
        engine.run_cycle().unwrap();

        // Already-applied on the server: success, drop from queue.
        assert!(queue.is_empty());
    }

    #[test]
    fn failed_push_leaves_queue_intact() {
        let (store, queue, transport) = setup();
        queue.enqueue(change(Uuid::new_v4(), 1, "a"));
        transport.script_push(Err(SyncError::transport_retryable("connection lost")));

        let engine = SyncEngine::new(config(), transport, store, Arc::clone(&queue));
        let result = engine.run_cycle();

        assert!(matches!(result, Err(SyncError::Transport { .. })));
        assert_eq!(queue.len(), 1);
        assert_eq!(engine.state(), SyncState::Idle);
        assert_eq!(engine.stats().cycles_skipped, 1);
        assert!(engine.stats().last_error.is_some());
    }

    #[test]
    fn pull_applies_and_advances_checkpoint() {
        let (store, queue, transport) = setup();
        let entity = Uuid::new_v4();
        transport.script_pull(Ok(PullResponse::success(
            vec![change(entity, 100, "pulled")],
            false,
        )));

        let engine = SyncEngine::new(config(), transport, Arc::clone(&store) as Arc<dyn EntityStore>, queue);
        let report = engine.run_cycle().unwrap();

        assert_eq!(report.pulled, 1);
        assert_eq!(engine.checkpoint().last_seen_ms, 100);
        let stored = store.get(entity).unwrap().unwrap();
        assert_eq!(stored.name, "pulled");
        assert_eq!(stored.updated_at_ms, 100);
    }

    #[test]
    fn pull_failure_leaves_checkpoint() {
        let (store, queue, transport) = setup();
        transport.script_pull(Err(SyncError::transport_retryable("connection lost")));

        let engine = SyncEngine::new(config(), transport, store, queue);
        assert!(engine.run_cycle().is_err());
        assert_eq!(engine.checkpoint().last_seen_ms, 0);
    }

    #[test]
    fn store_outage_mid_batch_keeps_checkpoint_for_replay() {
        let (store, queue, transport) = setup();
        let entity = Uuid::new_v4();
        transport.script_pull(Ok(PullResponse::success(
            vec![change(entity, 50, "first")],
            false,
        )));

        store.set_available(false);
        let engine = SyncEngine::new(config(), transport, Arc::clone(&store) as Arc<dyn EntityStore>, queue);

        let result = engine.run_cycle();
        assert!(matches!(result, Err(SyncError::StoreUnavailable(_))));
        assert_eq!(engine.checkpoint().last_seen_ms, 0);
        assert!(result.unwrap_err().is_transient());
    }

    #[test]
    fn stale_record_never_regresses_applied_state() {
        let (store, queue, transport) = setup();
        let entity = Uuid::new_v4();

        // Out of contract order: the newer edit arrives first.
        transport.script_pull(Ok(PullResponse::success(
            vec![change(entity, 200, "newer")],
            false,
        )));
        transport.script_pull(Ok(PullResponse::success(
            vec![change(entity, 100, "older")],
            false,
        )));

        let engine = SyncEngine::new(config(), transport, Arc::clone(&store) as Arc<dyn EntityStore>, queue);
        engine.run_cycle().unwrap();
        engine.run_cycle().unwrap();

        // The older edit lost by the total order and was discarded.
        assert_eq!(store.get(entity).unwrap().unwrap().name, "newer");
        assert_eq!(engine.stats().records_discarded, 1);
        // Checkpoint never moved backwards either.
        assert_eq!(engine.checkpoint().last_seen_ms, 200);
    }

    #[test]
    fn reapplying_a_batch_is_idempotent() {
        let (store, queue, transport) = setup();
        let entity_a = Uuid::new_v4();
        let entity_b = Uuid::new_v4();
        let batch = vec![
            change(entity_a, 10, "a"),
            change(entity_b, 20, "b"),
            ChangeRecord::delete(EntityKind::Request, entity_a, 30, "other-client"),
        ];

        // The same batch delivered twice, as after a crash before the
        // checkpoint advanced.
        transport.script_pull(Ok(PullResponse::success(batch.clone(), false)));
        transport.script_pull(Ok(PullResponse::success(batch, false)));

        let engine = SyncEngine::new(config(), transport, Arc::clone(&store) as Arc<dyn EntityStore>, queue);
        engine.run_cycle().unwrap();
        let after_first = (
            store.get(entity_a).unwrap(),
            store.get(entity_b).unwrap().map(|r| r.name),
        );

        engine.restore_checkpoint(SyncCheckpoint::new()); // crash replay
        engine.run_cycle().unwrap();
        let after_second = (
            store.get(entity_a).unwrap(),
            store.get(entity_b).unwrap().map(|r| r.name),
        );

        assert_eq!(after_first, after_second);
        assert!(after_first.0.is_none()); // the delete held
        assert_eq!(after_first.1.as_deref(), Some("b"));
    }

    #[test]
    fn delete_of_absent_entity_is_fine() {
        let (store, queue, transport) = setup();
        transport.script_pull(Ok(PullResponse::success(
            vec![ChangeRecord::delete(
                EntityKind::Folder,
                Uuid::new_v4(),
                10,
                "other-client",
            )],
            false,
        )));

        let engine = SyncEngine::new(config(), transport, store, queue);
        let report = engine.run_cycle().unwrap();
        assert_eq!(report.pulled, 1);
    }

    #[test]
    fn concurrent_cycle_is_refused() {
        struct BlockingTransport {
            entered: mpsc::Sender<()>,
            release: parking_lot::Mutex<mpsc::Receiver<()>>,
        }

        impl ChangeLogTransport for BlockingTransport {
            fn push(&self, _request: &PushRequest) -> SyncResult<PushResponse> {
                unreachable!("queue is empty")
            }

            fn pull(&self, _request: &PullRequest) -> SyncResult<PullResponse> {
                self.entered.send(()).unwrap();
                self.release.lock().recv().unwrap();
                Ok(PullResponse::success(vec![], false))
            }
        }

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let transport = BlockingTransport {
            entered: entered_tx,
            release: parking_lot::Mutex::new(release_rx),
        };

        let (store, queue, _) = setup();
        let engine = Arc::new(SyncEngine::new(config(), transport, store, queue));

        let background = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.run_cycle())
        };

        // Wait until the background cycle is inside its pull.
        entered_rx.recv().unwrap();
        assert_eq!(engine.state(), SyncState::Pulling);
        assert!(matches!(
            engine.run_cycle(),
            Err(SyncError::CycleInProgress)
        ));

        release_tx.send(()).unwrap();
        background.join().unwrap().unwrap();
        assert_eq!(engine.state(), SyncState::Idle);
    }
}
