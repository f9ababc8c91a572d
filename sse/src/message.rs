use axum::response::sse::Event as SseFrame;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Channel of the general notification stream.
pub const NOTIFICATIONS_CHANNEL: &str = "notifications";

pub const CONNECTION_EVENT: &str = "connection";
pub const PING_EVENT: &str = "ping";

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// What every SSE client receives inside a `data:` frame.
///
/// `id` is also written as the SSE `id:` field; the same logical change can
/// arrive once via an explicit mutation event and again via a recomputed view,
/// and clients use it to tell individual envelopes apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub timestamp: String,
}

impl NotificationEnvelope {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// First frame written to every new stream.
    pub fn connected() -> Self {
        Self::new(CONNECTION_EVENT, json!({ "status": "connected" }))
    }

    pub fn ping() -> Self {
        Self::new(PING_EVENT, json!({}))
    }

    /// Renders the envelope as a `data: <JSON>` frame. No SSE `event:` name is
    /// set so browsers deliver it to `onmessage`.
    pub fn to_frame(&self) -> Result<SseFrame, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(SseFrame::default().id(&self.id).data(json))
    }
}

/// Typed events produced by the explicit (post-write) notification path.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    #[serde(rename = "schedule_slot_created")]
    ScheduleSlotCreated { instructor_id: String, slot: Value },

    #[serde(rename = "lesson_request_accepted")]
    LessonRequestAccepted { instructor_id: String, lesson: Value },
    #[serde(rename = "lesson_request_rejected")]
    LessonRequestRejected { instructor_id: String, lesson: Value },

    #[serde(rename = "ticket_request_accepted")]
    TicketRequestAccepted {
        ticket_class_id: String,
        student_id: String,
        ticket_class: Value,
    },
    #[serde(rename = "ticket_request_rejected")]
    TicketRequestRejected {
        ticket_class_id: String,
        student_id: String,
    },

    #[serde(rename = "certificate_issued")]
    CertificateIssued { certificate: Value },
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::ScheduleSlotCreated { .. } => "schedule_slot_created",
            Event::LessonRequestAccepted { .. } => "lesson_request_accepted",
            Event::LessonRequestRejected { .. } => "lesson_request_rejected",
            Event::TicketRequestAccepted { .. } => "ticket_request_accepted",
            Event::TicketRequestRejected { .. } => "ticket_request_rejected",
            Event::CertificateIssued { .. } => "certificate_issued",
        }
    }
}

impl Event {
    /// The JSON object carried in the envelope's `data` field.
    pub fn data(&self) -> Result<Value, serde_json::Error> {
        let mut tagged = serde_json::to_value(self)?;
        Ok(tagged
            .get_mut("data")
            .map(Value::take)
            .unwrap_or_else(|| json!({})))
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event_type: String,
    pub data: Value,
    pub scope: MessageScope,
}

impl Message {
    pub fn broadcast(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            scope: MessageScope::Broadcast,
        }
    }

    pub fn to_channel(
        channel: impl Into<String>,
        event_type: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            scope: MessageScope::Channel {
                name: channel.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageScope {
    /// Send to every open connection
    Broadcast,
    /// Send to the connections registered on one channel
    Channel { name: String },
}
