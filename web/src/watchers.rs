//! Keeps one change-stream watcher alive per watched collection.
//!
//! A watcher whose feed fails or closes is reopened after a delay that
//! doubles on every consecutive failure, capped at [`MAX_RESTART_DELAY`].
//! A watcher that ran for longer than the cap before stopping starts over
//! from [`INITIAL_RESTART_DELAY`].

use ::sse::watcher::Watcher;
use ::sse::Manager;
use domain::change_stream::MongoChangeFeed;
use domain::events::ViewProjection;
use domain::order::PendingOrdersProjection;
use domain::pending_request::{PendingLessonsProjection, PendingTicketRequestsProjection};
use domain::{instructors, orders, ticket_classes};
use log::*;
use mongodb::Database;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const INITIAL_RESTART_DELAY: Duration = Duration::from_secs(1);
pub const MAX_RESTART_DELAY: Duration = Duration::from_secs(60);

/// Spawns the process-wide watchers: instructors, ticket classes and orders.
pub fn spawn_watchers(db: &Database, manager: Arc<Manager>) -> Vec<JoinHandle<()>> {
    let watched: [(&'static str, Arc<dyn ViewProjection>); 3] = [
        (
            instructors::COLLECTION,
            Arc::new(PendingLessonsProjection::new(db.clone())),
        ),
        (
            ticket_classes::COLLECTION,
            Arc::new(PendingTicketRequestsProjection::new(db.clone())),
        ),
        (
            orders::COLLECTION,
            Arc::new(PendingOrdersProjection::new(db.clone())),
        ),
    ];

    watched
        .into_iter()
        .map(|(collection, projection)| {
            tokio::spawn(supervise(
                db.clone(),
                collection,
                projection,
                manager.clone(),
            ))
        })
        .collect()
}

async fn supervise(
    db: Database,
    collection: &'static str,
    projection: Arc<dyn ViewProjection>,
    manager: Arc<Manager>,
) {
    let mut backoff = RestartBackoff::new(INITIAL_RESTART_DELAY, MAX_RESTART_DELAY);

    loop {
        match MongoChangeFeed::open(&db, collection).await {
            Ok(feed) => {
                let started = Instant::now();
                match Watcher::new(feed, projection.clone(), manager.clone())
                    .run()
                    .await
                {
                    Ok(changes) => {
                        warn!("Change stream on {collection} closed after {changes} change(s)")
                    }
                    Err(e) => error!("Change stream on {collection} failed: {e}"),
                }
                if started.elapsed() > MAX_RESTART_DELAY {
                    backoff.reset();
                }
            }
            Err(e) => error!("Failed to open change stream on {collection}: {e}"),
        }

        let delay = backoff.next_delay();
        info!("Reopening change stream on {collection} in {delay:?}");
        tokio::time::sleep(delay).await;
    }
}

/// Doubling restart delay with an upper bound.
#[derive(Debug, Clone)]
pub struct RestartBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl RestartBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_up_to_the_cap() {
        let mut backoff = RestartBackoff::new(INITIAL_RESTART_DELAY, MAX_RESTART_DELAY);

        let delays: Vec<u64> = (0..8).map(|_| backoff.next_delay().as_secs()).collect();

        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60]);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut backoff = RestartBackoff::new(Duration::from_millis(500), Duration::from_secs(5));
        backoff.next_delay();
        backoff.next_delay();

        backoff.reset();

        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }
}
