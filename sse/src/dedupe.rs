use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

/// Suppresses a recomputed view that is identical to the last one sent for
/// the same `(channel, type)` within `window`. Only the most recent value per
/// key is remembered, so a view that changes and changes back is always
/// delivered. A zero window admits everything.
pub struct DuplicateFilter {
    window: Duration,
    last_sent: DashMap<(String, String), (u64, Instant)>,
}

impl DuplicateFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns `true` if the view should be delivered, remembering it as the
    /// last value for its key.
    pub fn admit(&self, channel: &str, event_type: &str, data: &Value) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let now = Instant::now();
        let fingerprint = fingerprint(data);
        let key = (channel.to_string(), event_type.to_string());

        match self.last_sent.entry(key) {
            Entry::Occupied(mut last) => {
                let (last_fingerprint, sent_at) = *last.get();
                if last_fingerprint == fingerprint && now.duration_since(sent_at) < self.window {
                    return false;
                }
                last.insert((fingerprint, now));
            }
            Entry::Vacant(slot) => {
                slot.insert((fingerprint, now));
            }
        }
        true
    }
}

fn fingerprint(data: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(data, &mut hasher);
    hasher.finish()
}

// Object keys are hashed in sorted order: the map may preserve insertion order
fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Number(n) => {
            2u8.hash(hasher);
            n.to_string().hash(hasher);
        }
        Value::String(s) => {
            3u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Array(items) => {
            4u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(map) => {
            5u8.hash(hasher);
            map.len().hash(hasher);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                key.hash(hasher);
                hash_value(&map[key.as_str()], hasher);
            }
        }
    }
}
