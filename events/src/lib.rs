//! Event system infrastructure for the driving school backend.
//!
//! This crate provides the seams that let domain logic stay unaware of how
//! notifications reach browsers or administrators.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler** / **EventPublisher**: explicit, post-write notification path
//! - **NotificationSink**: side channels fed by every broadcast (e.g. admin email)
//! - **ChangeFeed** / **ViewProjection**: the database-driven path, where a
//!   collection write triggers a full recompute of a derived view
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use log::*;
use serde_json::Value;
use std::sync::Arc;

pub mod change;
pub mod sink;

pub use change::{BoxError, ChangeFeed, ChangeOperation, CollectionChange, ViewProjection};
pub use sink::NotificationSink;

/// Document ids travel as 24-character hex strings (MongoDB ObjectId).
pub type Id = String;

/// Domain events that represent business-level changes in the system.
/// These events are emitted after the corresponding write has succeeded.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new slot was appended to one of an instructor's schedules.
    ScheduleSlotCreated {
        instructor_id: Id,
        /// The created slot as returned to the API caller.
        slot: Value,
    },
    /// A pending driving lesson was approved and is now booked.
    LessonRequestAccepted { instructor_id: Id, lesson: Value },
    /// A pending driving lesson was declined.
    LessonRequestRejected { instructor_id: Id, lesson: Value },
    /// A student's request for a ticket class was approved and the student enrolled.
    TicketRequestAccepted {
        ticket_class_id: Id,
        student_id: Id,
        ticket_class: Value,
    },
    /// A student's request for a ticket class was declined and removed.
    TicketRequestRejected { ticket_class_id: Id, student_id: Id },
    /// A certificate was issued for a student and class.
    CertificateIssued { certificate: Value },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ScheduleSlotCreated { .. } => "ScheduleSlotCreated",
            DomainEvent::LessonRequestAccepted { .. } => "LessonRequestAccepted",
            DomainEvent::LessonRequestRejected { .. } => "LessonRequestRejected",
            DomainEvent::TicketRequestAccepted { .. } => "TicketRequestAccepted",
            DomainEvent::TicketRequestRejected { .. } => "TicketRequestRejected",
            DomainEvent::CertificateIssued { .. } => "CertificateIssued",
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers.
    pub async fn publish(&self, event: DomainEvent) {
        debug!(
            "Publishing {} to {} handler(s)",
            event.name(),
            self.handlers.len()
        );
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
