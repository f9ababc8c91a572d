use crate::message::{Event as SseEvent, EventType, Message as SseMessage};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to SSE messages and broadcasting
/// them to every open connection.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }

    fn to_sse_event(event: &DomainEvent) -> SseEvent {
        match event.clone() {
            DomainEvent::ScheduleSlotCreated {
                instructor_id,
                slot,
            } => SseEvent::ScheduleSlotCreated {
                instructor_id,
                slot,
            },
            DomainEvent::LessonRequestAccepted {
                instructor_id,
                lesson,
            } => SseEvent::LessonRequestAccepted {
                instructor_id,
                lesson,
            },
            DomainEvent::LessonRequestRejected {
                instructor_id,
                lesson,
            } => SseEvent::LessonRequestRejected {
                instructor_id,
                lesson,
            },
            DomainEvent::TicketRequestAccepted {
                ticket_class_id,
                student_id,
                ticket_class,
            } => SseEvent::TicketRequestAccepted {
                ticket_class_id,
                student_id,
                ticket_class,
            },
            DomainEvent::TicketRequestRejected {
                ticket_class_id,
                student_id,
            } => SseEvent::TicketRequestRejected {
                ticket_class_id,
                student_id,
            },
            DomainEvent::CertificateIssued { certificate } => {
                SseEvent::CertificateIssued { certificate }
            }
        }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let sse_event = Self::to_sse_event(event);
        let data = match sse_event.data() {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to serialize {} for SSE: {e}", event.name());
                return;
            }
        };

        let delivered = self
            .sse_manager
            .send_message(SseMessage::broadcast(sse_event.event_type(), data));
        debug!(
            "Broadcast {} as '{}' to {delivered} connection(s)",
            event.name(),
            sse_event.event_type()
        );
    }
}
