//! Property tests for the total order.

use courier_sync_protocol::{ChangeLog, ChangeRecord, OrderKey};
use courier_store::EntityKind;
use proptest::prelude::*;
use uuid::Uuid;

fn record(timestamp_ms: i64) -> ChangeRecord {
    ChangeRecord::create(
        EntityKind::Request,
        Uuid::new_v4(),
        serde_json::json!({"t": timestamp_ms}),
        timestamp_ms,
        "client",
    )
}

proptest! {
    /// Whatever order records are appended in, a query returns them in
    /// strictly increasing (timestamp, id) order and loses none.
    #[test]
    fn query_returns_total_order(stamps in prop::collection::vec(0i64..20, 1..40)) {
        let log = ChangeLog::new();
        let project = Uuid::new_v4();
        for t in &stamps {
            log.append(project, record(*t)).unwrap();
        }

        let (records, has_more) = log.query(project, -1, 1000);
        prop_assert!(!has_more);
        prop_assert_eq!(records.len(), stamps.len());

        let keys: Vec<OrderKey> = records.iter().map(|r| r.order_key()).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    /// Batched consumption with a timestamp cursor visits every record
    /// exactly once, regardless of batch size.
    #[test]
    fn cursor_resume_loses_nothing(
        stamps in prop::collection::vec(0i64..10, 1..40),
        limit in 1usize..8,
    ) {
        let log = ChangeLog::new();
        let project = Uuid::new_v4();
        for t in &stamps {
            log.append(project, record(*t)).unwrap();
        }

        let mut seen = Vec::new();
        let mut since = -1i64;
        loop {
            let (batch, has_more) = log.query(project, since, limit);
            if batch.is_empty() {
                break;
            }
            since = batch.last().unwrap().timestamp_ms;
            seen.extend(batch);
            if !has_more {
                break;
            }
        }

        prop_assert_eq!(seen.len(), stamps.len());
        let keys: Vec<OrderKey> = seen.iter().map(|r| r.order_key()).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
