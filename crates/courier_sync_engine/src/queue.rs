//! The local outbound change queue.

use courier_sync_protocol::ChangeRecord;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Append-only queue of local changes awaiting push.
///
/// The UI layer enqueues a record for every local mutation; the sync
/// engine only drains. Records leave the queue exclusively through
/// [`commit_front`] after the server acknowledged the batch (accepted
/// or already-present both count), so a failed push leaves the queue
/// intact and the next cycle repeats it — pushes are idempotent.
///
/// [`commit_front`]: OutboundQueue::commit_front
#[derive(Default)]
pub struct OutboundQueue {
    records: Mutex<VecDeque<ChangeRecord>>,
}

impl OutboundQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record produced by a local mutation.
    pub fn enqueue(&self, record: ChangeRecord) {
        self.records.lock().push_back(record);
    }

    /// Clones up to `limit` records from the front, in queue order.
    pub fn peek_batch(&self, limit: usize) -> Vec<ChangeRecord> {
        self.records.lock().iter().take(limit).cloned().collect()
    }

    /// Removes the first `count` records after a successful push.
    pub fn commit_front(&self, count: usize) {
        let mut records = self.records.lock();
        for _ in 0..count.min(records.len()) {
            records.pop_front();
        }
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing awaits push.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_store::EntityKind;
    use uuid::Uuid;

    fn record(n: i64) -> ChangeRecord {
        ChangeRecord::create(
            EntityKind::Request,
            Uuid::new_v4(),
            serde_json::json!({"n": n}),
            n,
            "client-a",
        )
    }

    #[test]
    fn fifo_order() {
        let queue = OutboundQueue::new();
        queue.enqueue(record(1));
        queue.enqueue(record(2));
        queue.enqueue(record(3));

        let batch = queue.peek_batch(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].timestamp_ms, 1);
        assert_eq!(batch[1].timestamp_ms, 2);
        // Peeking does not drain.
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn commit_removes_front() {
        let queue = OutboundQueue::new();
        queue.enqueue(record(1));
        queue.enqueue(record(2));
        queue.enqueue(record(3));

        queue.commit_front(2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_batch(10)[0].timestamp_ms, 3);

        // Over-committing is clamped, not a panic.
        queue.commit_front(10);
        assert!(queue.is_empty());
    }
}
