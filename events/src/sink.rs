use serde_json::Value;

/// A side channel that observes every broadcast envelope.
///
/// `notify` runs inline in the broadcast path, so implementations must hand
/// slow work (network I/O) to a background task and return immediately.
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn notify(&self, event_type: &str, data: &Value, timestamp: &str);
}
