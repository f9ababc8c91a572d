use crate::connection::{ConnectionId, ConnectionRegistry, EventSender};
use crate::dedupe::DuplicateFilter;
use crate::message::{Message, MessageScope, NotificationEnvelope};
use events::NotificationSink;
use log::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// The broadcaster: turns messages into envelopes, fans them out to open
/// connections and feeds every registered [`NotificationSink`].
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    sinks: Vec<Arc<dyn NotificationSink>>,
    duplicates: DuplicateFilter,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            sinks: Vec::new(),
            duplicates: DuplicateFilter::disabled(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        info!("Broadcast side channel enabled: {}", sink.name());
        self.sinks.push(sink);
        self
    }

    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.duplicates = DuplicateFilter::new(window);
        self
    }

    /// Register a new connection and return its unique ID
    pub fn register_connection(&self, channel: &str, sender: EventSender) -> ConnectionId {
        let connection_id = self.registry.register(channel, sender);
        info!(
            "Registered SSE connection {} on channel {channel}",
            connection_id.as_str()
        );
        connection_id
    }

    /// Unregister a connection by ID
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        if self.registry.unregister(connection_id) {
            info!("Unregistered SSE connection {}", connection_id.as_str());
        }
    }

    /// Broadcast `(type, data)` to every open connection.
    pub fn broadcast(&self, event_type: &str, data: Value) -> usize {
        self.send_message(Message::broadcast(event_type, data))
    }

    /// Deliver a message according to its scope. Returns the number of
    /// connections written to. A channel view identical to the last one sent
    /// inside the dedupe window is skipped and returns 0; broadcasts are
    /// always delivered.
    pub fn send_message(&self, message: Message) -> usize {
        if let MessageScope::Channel { name } = &message.scope {
            if !self
                .duplicates
                .admit(name, &message.event_type, &message.data)
            {
                debug!("Suppressed unchanged '{}' on {name}", message.event_type);
                return 0;
            }
        }

        let envelope = NotificationEnvelope::new(message.event_type, message.data);
        let frame = match envelope.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to serialize SSE envelope: {e}");
                return 0;
            }
        };

        let delivered = match &message.scope {
            MessageScope::Broadcast => self.registry.broadcast(&frame),
            MessageScope::Channel { name } => self.registry.send_to_channel(name, &frame),
        };
        debug!(
            "Delivered '{}' ({}) to {delivered} connection(s)",
            envelope.event_type, envelope.id
        );

        for sink in &self.sinks {
            sink.notify(&envelope.event_type, &envelope.data, &envelope.timestamp);
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    pub fn channel_connection_count(&self, channel: &str) -> usize {
        self.registry.channel_connection_count(channel)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// Unregisters its connection when dropped. Held by the response stream so
/// that a client going away (stream dropped by the server) cleans up.
pub struct ConnectionGuard {
    manager: Arc<Manager>,
    connection_id: ConnectionId,
}

impl ConnectionGuard {
    pub fn new(manager: Arc<Manager>, connection_id: ConnectionId) -> Self {
        Self {
            manager,
            connection_id,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "SSE connection {} closed, cleaning up",
            self.connection_id.as_str()
        );
        self.manager.unregister_connection(&self.connection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NOTIFICATIONS_CHANNEL;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<(String, Value)>>,
    }

    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn notify(&self, event_type: &str, data: &Value, _timestamp: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((event_type.to_string(), data.clone()));
        }
    }

    #[tokio::test]
    async fn test_broadcast_writes_one_frame_per_connection() {
        let manager = Manager::new();
        let mut receivers = Vec::new();
        for _ in 0..4 {
            let (tx, rx) = mpsc::unbounded_channel();
            manager.register_connection(NOTIFICATIONS_CHANNEL, tx);
            receivers.push(rx);
        }

        let delivered = manager.broadcast("lesson_request_accepted", json!({"lesson": "abc"}));

        assert_eq!(delivered, 4);
        for rx in receivers.iter_mut() {
            assert!(rx.recv().await.unwrap().is_ok());
            assert!(rx.try_recv().is_err(), "exactly one frame per broadcast");
        }
    }

    #[tokio::test]
    async fn test_dead_connection_is_pruned_and_others_still_receive() {
        let manager = Manager::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        manager.register_connection(NOTIFICATIONS_CHANNEL, tx_a);
        manager.register_connection(NOTIFICATIONS_CHANNEL, tx_b);
        manager.register_connection(NOTIFICATIONS_CHANNEL, tx_c);
        drop(rx_b);

        assert_eq!(manager.broadcast("ping_test", json!({})), 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_c.recv().await.is_some());
        assert_eq!(manager.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_sinks_see_every_delivered_envelope() {
        let sink = Arc::new(RecordingSink::default());
        let manager = Manager::new().with_sink(sink.clone());

        // No connections: the side channel still fires
        assert_eq!(manager.broadcast("certificate_issued", json!({"n": 1})), 0);
        manager.send_message(Message::to_channel(
            "orders:pending",
            "pending_orders",
            json!([]),
        ));

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("certificate_issued".to_string(), json!({"n": 1})));
        assert_eq!(seen[1].0, "pending_orders");
    }

    #[tokio::test]
    async fn test_unchanged_channel_view_skips_delivery_and_sinks() {
        let sink = Arc::new(RecordingSink::default());
        let manager = Manager::new()
            .with_sink(sink.clone())
            .with_dedupe_window(Duration::from_secs(60));
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection("orders:pending", tx);
        let view = |data: Value| Message::to_channel("orders:pending", "pending_orders", data);

        assert_eq!(manager.send_message(view(json!([]))), 1);
        assert_eq!(manager.send_message(view(json!([]))), 0);
        assert_eq!(manager.send_message(view(json!([{"studentId": "s1"}]))), 1);
        assert_eq!(manager.send_message(view(json!([]))), 1);

        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(sink.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_identical_broadcasts_are_all_delivered() {
        let manager = Manager::new().with_dedupe_window(Duration::from_secs(60));
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection(NOTIFICATIONS_CHANNEL, tx);

        assert_eq!(manager.broadcast("order_created", json!({"status": "paid"})), 1);
        assert_eq!(manager.broadcast("order_created", json!({"status": "paid"})), 1);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_guard_unregisters_on_drop() {
        let manager = Arc::new(Manager::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = manager.register_connection("instructors:pending-requests", tx);
        let guard = ConnectionGuard::new(manager.clone(), id);

        assert_eq!(manager.channel_connection_count("instructors:pending-requests"), 1);
        drop(guard);
        assert_eq!(manager.connection_count(), 0);
    }
}
