use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

/// Named group of connections fed by the same producer (e.g. one change-stream watcher).
pub type Channel = String;

pub type EventSender = UnboundedSender<Result<Event, Infallible>>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub channel: Channel,
    pub sender: EventSender,
}

/// Registry of open SSE streams with a secondary index by channel.
///
/// A write that fails means the receiving half is gone (client disconnected,
/// handler dropped). Such connections are removed once the delivery loop has
/// finished, so one dead stream never blocks delivery to the others.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    channel_index: DashMap<Channel, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            channel_index: DashMap::new(),
        }
    }

    pub fn register(&self, channel: &str, sender: EventSender) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                channel: channel.to_string(),
                sender,
            },
        );

        self.channel_index
            .entry(channel.to_string())
            .or_default()
            .insert(connection_id.clone());

        connection_id
    }

    /// Removes a connection. Unknown or already-removed ids are ignored.
    /// Returns whether anything was removed.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let Some((_, info)) = self.connections.remove(connection_id) else {
            return false;
        };

        if let Some(mut entry) = self.channel_index.get_mut(&info.channel) {
            entry.remove(connection_id);

            if entry.is_empty() {
                drop(entry); // Release lock before removal
                self.channel_index.remove(&info.channel);
            }
        }
        true
    }

    /// Sends to every connection on `channel`; returns the number of successful writes.
    pub fn send_to_channel(&self, channel: &str, event: &Event) -> usize {
        // Copy the ids out so no index lock is held while writing
        let connection_ids: Vec<ConnectionId> = match self.channel_index.get(channel) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for conn_id in connection_ids {
            if let Some(info) = self.connections.get(&conn_id) {
                match info.sender.send(Ok(event.clone())) {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        warn!(
                            "Failed to send event to connection {}: {}. Connection will be cleaned up.",
                            conn_id.as_str(),
                            e
                        );
                        dead.push(conn_id.clone());
                    }
                }
            }
        }

        self.prune(dead);
        delivered
    }

    /// Sends to every registered connection regardless of channel.
    pub fn broadcast(&self, event: &Event) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();
        for entry in self.connections.iter() {
            match entry.value().sender.send(Ok(event.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        "Failed to send broadcast to connection {}: {}",
                        entry.key().as_str(),
                        e
                    );
                    dead.push(entry.key().clone());
                }
            }
        }

        self.prune(dead);
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn channel_connection_count(&self, channel: &str) -> usize {
        self.channel_index
            .get(channel)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    fn prune(&self, dead: Vec<ConnectionId>) {
        for conn_id in dead {
            self.unregister(&conn_id);
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn event() -> Event {
        Event::default().data("{}")
    }

    #[test]
    fn test_broadcast_reaches_every_connection() {
        let registry = ConnectionRegistry::new();
        let mut receivers = Vec::new();
        for channel in ["notifications", "notifications", "orders:pending"] {
            let (tx, rx) = mpsc::unbounded_channel();
            registry.register(channel, tx);
            receivers.push(rx);
        }

        assert_eq!(registry.broadcast(&event()), 3);
        for rx in receivers.iter_mut() {
            assert!(rx.try_recv().is_ok());
        }
    }

    #[test]
    fn test_channel_send_only_reaches_that_channel() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.register("instructors:pending-requests", tx_a);
        registry.register("notifications", tx_b);

        assert_eq!(
            registry.send_to_channel("instructors:pending-requests", &event()),
            1
        );
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.send_to_channel("nobody-listens", &event()), 0);
    }

    #[test]
    fn test_failed_write_removes_only_the_dead_connection() {
        let registry = ConnectionRegistry::new();
        let (tx_alive, mut rx_alive) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        let (tx_other, mut rx_other) = mpsc::unbounded_channel();
        registry.register("notifications", tx_alive);
        let dead_id = registry.register("notifications", tx_dead);
        registry.register("notifications", tx_other);
        drop(rx_dead);

        assert_eq!(registry.broadcast(&event()), 2);
        assert!(rx_alive.try_recv().is_ok());
        assert!(rx_other.try_recv().is_ok());
        assert_eq!(registry.connection_count(), 2);
        assert!(!registry.unregister(&dead_id));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx_keep, mut rx_keep) = mpsc::unbounded_channel();
        let (tx_drop, _rx_drop) = mpsc::unbounded_channel();
        registry.register("notifications", tx_keep);
        let id = registry.register("notifications", tx_drop);

        assert!(registry.unregister(&id));
        assert!(!registry.unregister(&id));
        assert!(!registry.unregister(&ConnectionId::new()));

        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.channel_connection_count("notifications"), 1);
        assert_eq!(registry.broadcast(&event()), 1);
        assert!(rx_keep.try_recv().is_ok());
    }

    #[test]
    fn test_empty_channel_is_removed_from_index() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = registry.register("orders:pending", tx);
        assert_eq!(registry.channel_connection_count("orders:pending"), 1);

        registry.unregister(&id);
        assert_eq!(registry.channel_connection_count("orders:pending"), 0);
        assert!(registry.channel_index.get("orders:pending").is_none());
    }
}
