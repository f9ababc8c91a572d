use crate::message::Message;
use crate::Manager;
use events::{BoxError, ChangeFeed, CollectionChange, ViewProjection};
use log::*;
use std::sync::Arc;

/// Recomputes a view on every change reported by a feed and pushes it to the
/// view's channel. One watcher serves every subscriber of that channel.
pub struct Watcher<F: ChangeFeed> {
    feed: F,
    projection: Arc<dyn ViewProjection>,
    manager: Arc<Manager>,
}

impl<F: ChangeFeed> Watcher<F> {
    pub fn new(feed: F, projection: Arc<dyn ViewProjection>, manager: Arc<Manager>) -> Self {
        Self {
            feed,
            projection,
            manager,
        }
    }

    /// Runs until the feed closes (`Ok`, with the number of changes seen) or
    /// fails (`Err`). Projection failures are logged and the change skipped.
    pub async fn run(self) -> Result<u64, BoxError> {
        let Self {
            mut feed,
            projection,
            manager,
        } = self;

        let mut changes_seen = 0;
        info!("Watching for changes feeding '{}'", projection.event_type());

        while let Some(next) = feed.next_change().await {
            let change = next?;
            changes_seen += 1;
            handle_change(projection.as_ref(), &manager, &change).await;
        }

        info!(
            "Change feed for '{}' closed after {changes_seen} change(s)",
            projection.event_type()
        );
        Ok(changes_seen)
    }
}

async fn handle_change(
    projection: &dyn ViewProjection,
    manager: &Manager,
    change: &CollectionChange,
) -> usize {
    debug!(
        "{:?} on {} ({}), recomputing '{}'",
        change.operation,
        change.collection,
        change.document_id.as_deref().unwrap_or("-"),
        projection.event_type()
    );

    match projection.project().await {
        Ok(view) => manager.send_message(Message::to_channel(
            projection.channel(),
            projection.event_type(),
            view,
        )),
        Err(e) => {
            error!(
                "Failed to recompute '{}' after change on {}: {e}",
                projection.event_type(),
                change.collection
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use events::ChangeOperation;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::mpsc;

    struct ScriptedFeed {
        items: VecDeque<Result<CollectionChange, BoxError>>,
    }

    #[async_trait]
    impl ChangeFeed for ScriptedFeed {
        async fn next_change(&mut self) -> Option<Result<CollectionChange, BoxError>> {
            self.items.pop_front()
        }
    }

    fn change(operation: ChangeOperation) -> Result<CollectionChange, BoxError> {
        Ok(CollectionChange {
            collection: "instructors".to_string(),
            operation,
            document_id: Some("65f0c0ffee0000000000abcd".to_string()),
        })
    }

    /// Counts calls and fails on the ones listed in `fail_on`.
    struct CountingProjection {
        calls: AtomicU64,
        fail_on: Vec<u64>,
    }

    #[async_trait]
    impl ViewProjection for CountingProjection {
        fn event_type(&self) -> &'static str {
            "pending_lesson_requests"
        }

        fn channel(&self) -> &'static str {
            "instructors:pending-requests"
        }

        async fn project(&self) -> Result<Value, BoxError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&call) {
                return Err("database unavailable".into());
            }
            Ok(json!({ "recompute": call }))
        }
    }

    #[tokio::test]
    async fn test_every_change_recomputes_and_broadcasts_to_channel() {
        let manager = Arc::new(Manager::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection("instructors:pending-requests", tx);
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        manager.register_connection("orders:pending", other_tx);

        let feed = ScriptedFeed {
            items: VecDeque::from(vec![
                change(ChangeOperation::Insert),
                change(ChangeOperation::Update),
                change(ChangeOperation::Delete),
            ]),
        };
        let projection = Arc::new(CountingProjection {
            calls: AtomicU64::new(0),
            fail_on: vec![],
        });

        let seen = Watcher::new(feed, projection.clone(), manager.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(seen, 3);
        assert_eq!(projection.calls.load(Ordering::SeqCst), 3);
        for _ in 0..3 {
            assert!(rx.try_recv().is_ok());
        }
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_projection_error_drops_change_and_keeps_watching() {
        let manager = Arc::new(Manager::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection("instructors:pending-requests", tx);

        let feed = ScriptedFeed {
            items: VecDeque::from(vec![
                change(ChangeOperation::Update),
                change(ChangeOperation::Update),
                change(ChangeOperation::Replace),
            ]),
        };
        let projection = Arc::new(CountingProjection {
            calls: AtomicU64::new(0),
            fail_on: vec![2],
        });

        let seen = Watcher::new(feed, projection, manager.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(seen, 3);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_feed_error_ends_run() {
        let manager = Arc::new(Manager::new());
        let feed = ScriptedFeed {
            items: VecDeque::from(vec![
                change(ChangeOperation::Insert),
                Err("cursor killed".into()),
                change(ChangeOperation::Insert),
            ]),
        };
        let projection = Arc::new(CountingProjection {
            calls: AtomicU64::new(0),
            fail_on: vec![],
        });

        let result = Watcher::new(feed, projection.clone(), manager).run().await;

        assert!(result.is_err());
        assert_eq!(projection.calls.load(Ordering::SeqCst), 1);
    }

    /// Holds a `Cell`, so it is `Send` but not `Sync`, like a database cursor.
    struct CursorLikeFeed {
        remaining: std::cell::Cell<u32>,
    }

    #[async_trait]
    impl ChangeFeed for CursorLikeFeed {
        async fn next_change(&mut self) -> Option<Result<CollectionChange, BoxError>> {
            let left = self.remaining.get();
            if left == 0 {
                return None;
            }
            self.remaining.set(left - 1);
            Some(change(ChangeOperation::Update))
        }
    }

    #[tokio::test]
    async fn test_watcher_over_non_sync_feed_runs_on_spawned_task() {
        let manager = Arc::new(Manager::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection("instructors:pending-requests", tx);
        let feed = CursorLikeFeed {
            remaining: std::cell::Cell::new(2),
        };
        let projection = Arc::new(CountingProjection {
            calls: AtomicU64::new(0),
            fail_on: vec![],
        });

        let seen = tokio::spawn(Watcher::new(feed, projection, manager).run())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(seen, 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}
