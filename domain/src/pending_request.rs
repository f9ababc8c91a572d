//! Requests waiting for an administrator's decision.
//!
//! Neither view is stored: both are recomputed from the instructor and ticket
//! class documents whenever they are asked for or whenever those collections
//! change.

use crate::error::Error;
use crate::rfc3339;
use crate::schedule::SlotView;
use async_trait::async_trait;
use entity::request_status::RequestStatus;
use entity::{instructors, ticket_classes};
use entity_api::{instructor, ticket_class};
use events::{BoxError, ViewProjection};
use mongodb::Database;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

pub const PENDING_LESSONS_EVENT: &str = "pending_lesson_requests";
pub const PENDING_LESSONS_CHANNEL: &str = "instructors:pending-requests";

pub const PENDING_TICKETS_EVENT: &str = "pending_ticket_requests";
pub const PENDING_TICKETS_CHANNEL: &str = "ticketclasses:pending-requests";

/// A driving lesson a student asked for and will pay at the school.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingLessonRequest {
    pub instructor_id: String,
    pub instructor_name: String,
    #[serde(flatten)]
    pub lesson: SlotView,
}

/// A student's pending request for a seat in a ticket class.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingTicketRequest {
    pub ticket_class_id: String,
    pub date: String,
    pub hour: String,
    #[serde(rename = "type")]
    pub class_type: String,
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Pending, locally paid driving lessons across all instructors, earliest first.
pub fn pending_lessons(instructors: &[instructors::Model]) -> Vec<PendingLessonRequest> {
    let mut requests: Vec<PendingLessonRequest> = instructors
        .iter()
        .flat_map(|instructor| {
            instructor
                .schedule_driving_lesson
                .iter()
                .filter(|slot| slot.is_pending_local_payment())
                .map(move |slot| PendingLessonRequest {
                    instructor_id: instructor.id.to_hex(),
                    instructor_name: instructor.name.clone(),
                    lesson: SlotView::from(slot),
                })
        })
        .collect();

    requests.sort_by(|a, b| {
        (&a.lesson.date, &a.lesson.start).cmp(&(&b.lesson.date, &b.lesson.start))
    });
    requests
}

/// Pending seat requests across all ticket classes, in class order.
pub fn pending_ticket_requests(classes: &[ticket_classes::Model]) -> Vec<PendingTicketRequest> {
    classes
        .iter()
        .flat_map(|class| {
            class
                .student_requests
                .iter()
                .filter(|request| request.status == RequestStatus::Pending)
                .map(move |request| PendingTicketRequest {
                    ticket_class_id: class.id.to_hex(),
                    date: class.date.clone(),
                    hour: class.hour.clone(),
                    class_type: class.class_type.clone(),
                    student_id: request.student_id.to_hex(),
                    request_date: request.request_date.as_ref().map(rfc3339),
                    payment_method: request.payment_method.map(|method| method.to_string()),
                })
        })
        .collect()
}

pub async fn find_pending_lessons(db: &Database) -> Result<Vec<PendingLessonRequest>, Error> {
    let instructors = instructor::find_all(db).await?;
    Ok(pending_lessons(&instructors))
}

pub async fn find_pending_ticket_requests(
    db: &Database,
) -> Result<Vec<PendingTicketRequest>, Error> {
    let classes = ticket_class::find_with_pending_requests(db).await?;
    Ok(pending_ticket_requests(&classes))
}

/// Recomputes [`find_pending_lessons`] for the `instructors` watcher.
pub struct PendingLessonsProjection {
    db: Database,
}

impl PendingLessonsProjection {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ViewProjection for PendingLessonsProjection {
    fn event_type(&self) -> &'static str {
        PENDING_LESSONS_EVENT
    }

    fn channel(&self) -> &'static str {
        PENDING_LESSONS_CHANNEL
    }

    async fn project(&self) -> Result<Value, BoxError> {
        let requests = find_pending_lessons(&self.db).await?;
        Ok(serde_json::to_value(requests)?)
    }
}

/// Recomputes [`find_pending_ticket_requests`] for the `ticketclasses` watcher.
pub struct PendingTicketRequestsProjection {
    db: Database,
}

impl PendingTicketRequestsProjection {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ViewProjection for PendingTicketRequestsProjection {
    fn event_type(&self) -> &'static str {
        PENDING_TICKETS_EVENT
    }

    fn channel(&self) -> &'static str {
        PENDING_TICKETS_CHANNEL
    }

    async fn project(&self) -> Result<Value, BoxError> {
        let requests = find_pending_ticket_requests(&self.db).await?;
        Ok(serde_json::to_value(requests)?)
    }
}
