use crate::error::Error;
use crate::schedule::{parse_id, SlotView};
use crate::store::InstructorStore;
use entity::instructors;
use entity::schedule_slots;
use entity::slot_status::SlotStatus;
use entity::Id;
use events::{DomainEvent, EventPublisher};
use log::*;

/// An administrator's answer to a pending lesson request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// Rejected lessons keep their student fields so the history stays readable.
    pub fn resulting_status(&self) -> SlotStatus {
        match self {
            Decision::Accept => SlotStatus::Booked,
            Decision::Reject => SlotStatus::Cancelled,
        }
    }
}

/// Looks up a lesson that is still waiting for a decision.
pub fn pending_lesson<'a>(
    instructor: &'a instructors::Model,
    lesson_id: &Id,
) -> Result<&'a schedule_slots::Model, Error> {
    let lesson = instructor.find_lesson(lesson_id).ok_or_else(|| {
        warn!(
            "Lesson {lesson_id} not found in instructor {}'s schedule",
            instructor.id
        );
        Error::not_found()
    })?;

    if lesson.status != SlotStatus::Pending {
        return Err(Error::validation(format!(
            "Only pending lessons can be accepted or rejected (current status: {})",
            lesson.status
        )));
    }
    Ok(lesson)
}

pub async fn accept(
    store: &impl InstructorStore,
    event_publisher: &EventPublisher,
    instructor_id: &str,
    lesson_id: &str,
) -> Result<SlotView, Error> {
    decide(store, event_publisher, instructor_id, lesson_id, Decision::Accept).await
}

pub async fn reject(
    store: &impl InstructorStore,
    event_publisher: &EventPublisher,
    instructor_id: &str,
    lesson_id: &str,
) -> Result<SlotView, Error> {
    decide(store, event_publisher, instructor_id, lesson_id, Decision::Reject).await
}

async fn decide(
    store: &impl InstructorStore,
    event_publisher: &EventPublisher,
    instructor_id: &str,
    lesson_id: &str,
    decision: Decision,
) -> Result<SlotView, Error> {
    let instructor_id = parse_id(instructor_id, "instructorId")?;
    let lesson_id = parse_id(lesson_id, "lessonId")?;

    let current = store.find_instructor(instructor_id).await?;
    pending_lesson(&current, &lesson_id)?;

    let updated = store
        .update_lesson_status(
            instructor_id,
            lesson_id,
            SlotStatus::Pending,
            decision.resulting_status(),
        )
        .await?
        // Someone else decided between our read and our write
        .ok_or_else(|| Error::validation("The lesson is no longer pending"))?;

    let lesson = updated
        .find_lesson(&lesson_id)
        .map(SlotView::from)
        .ok_or_else(Error::not_found)?;
    info!(
        "Lesson {lesson_id} of instructor {instructor_id} is now {}",
        lesson.status
    );

    let lesson_json = serde_json::to_value(&lesson)?;
    let event = match decision {
        Decision::Accept => DomainEvent::LessonRequestAccepted {
            instructor_id: instructor_id.to_hex(),
            lesson: lesson_json,
        },
        Decision::Reject => DomainEvent::LessonRequestRejected {
            instructor_id: instructor_id.to_hex(),
            lesson: lesson_json,
        },
    };
    event_publisher.publish(event).await;

    Ok(lesson)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use crate::store::memory::{recording_publisher, InMemoryStore};
    use mongodb::bson::oid::ObjectId;

    fn instructor_with(status: SlotStatus) -> (instructors::Model, Id) {
        let lesson_id = ObjectId::new();
        let instructor = instructors::Model {
            id: ObjectId::new(),
            name: "Ana".to_string(),
            email: None,
            dni: None,
            version: 4,
            schedule_driving_test: vec![],
            schedule_driving_lesson: vec![schedule_slots::Model {
                id: lesson_id,
                date: "2025-03-01".to_string(),
                start: "10:00".to_string(),
                end: "11:00".to_string(),
                status,
                class_type: None,
                student_id: Some(ObjectId::new()),
                student_name: Some("Luis".to_string()),
                payment_method: None,
                amount: None,
            }],
        };
        (instructor, lesson_id)
    }

    #[test]
    fn test_pending_lesson_is_decidable() {
        let (instructor, lesson_id) = instructor_with(SlotStatus::Pending);
        assert_eq!(pending_lesson(&instructor, &lesson_id).unwrap().id, lesson_id);
    }

    #[test]
    fn test_unknown_lesson_is_not_found() {
        let (instructor, _) = instructor_with(SlotStatus::Pending);
        let err = pending_lesson(&instructor, &ObjectId::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_already_decided_lesson_is_a_validation_error() {
        for status in [SlotStatus::Booked, SlotStatus::Cancelled, SlotStatus::Available] {
            let (instructor, lesson_id) = instructor_with(status);
            let err = pending_lesson(&instructor, &lesson_id).unwrap_err();
            assert!(matches!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Validation(_))
            ));
        }
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(Decision::Accept.resulting_status(), SlotStatus::Booked);
        assert_eq!(Decision::Reject.resulting_status(), SlotStatus::Cancelled);
    }

    fn is_validation(err: &Error) -> bool {
        matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        )
    }

    fn store_with(status: SlotStatus) -> (InMemoryStore, Id, Id) {
        let (instructor, lesson_id) = instructor_with(status);
        let instructor_id = instructor.id;
        let store = InMemoryStore::default();
        store.instructors.lock().unwrap().push(instructor);
        (store, instructor_id, lesson_id)
    }

    #[tokio::test]
    async fn test_accept_books_the_lesson_and_publishes() {
        let (store, instructor_id, lesson_id) = store_with(SlotStatus::Pending);
        let (publisher, events) = recording_publisher();

        let lesson = accept(
            &store,
            &publisher,
            &instructor_id.to_hex(),
            &lesson_id.to_hex(),
        )
        .await
        .unwrap();

        assert_eq!(lesson.status, "booked");
        assert_eq!(lesson.student_name.as_deref(), Some("Luis"));
        let stored = store.instructor(instructor_id);
        assert_eq!(stored.schedule_driving_lesson[0].status, SlotStatus::Booked);
        assert_eq!(stored.version, 5);
        assert_eq!(*events.names.lock().unwrap(), vec!["LessonRequestAccepted"]);
    }

    #[tokio::test]
    async fn test_reject_cancels_and_keeps_student_fields() {
        let (store, instructor_id, lesson_id) = store_with(SlotStatus::Pending);
        let (publisher, events) = recording_publisher();

        let lesson = reject(
            &store,
            &publisher,
            &instructor_id.to_hex(),
            &lesson_id.to_hex(),
        )
        .await
        .unwrap();

        assert_eq!(lesson.status, "cancelled");
        assert!(lesson.student_id.is_some());
        assert_eq!(*events.names.lock().unwrap(), vec!["LessonRequestRejected"]);
    }

    #[tokio::test]
    async fn test_deciding_twice_is_a_validation_error() {
        let (store, instructor_id, lesson_id) = store_with(SlotStatus::Pending);
        let (publisher, events) = recording_publisher();
        let (instructor_id, lesson_id) = (instructor_id.to_hex(), lesson_id.to_hex());

        accept(&store, &publisher, &instructor_id, &lesson_id)
            .await
            .unwrap();
        let err = reject(&store, &publisher, &instructor_id, &lesson_id)
            .await
            .unwrap_err();

        assert!(is_validation(&err));
        assert_eq!(events.names.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_decision_lost_to_a_concurrent_one_is_a_validation_error() {
        let (store, instructor_id, lesson_id) = store_with(SlotStatus::Pending);
        *store.concurrent_lesson_status.lock().unwrap() = Some(SlotStatus::Cancelled);
        let (publisher, events) = recording_publisher();

        let err = accept(
            &store,
            &publisher,
            &instructor_id.to_hex(),
            &lesson_id.to_hex(),
        )
        .await
        .unwrap_err();

        assert!(is_validation(&err));
        assert!(events.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_instructor_or_lesson_is_not_found() {
        let (store, instructor_id, _) = store_with(SlotStatus::Pending);
        let (publisher, _) = recording_publisher();

        let err = accept(
            &store,
            &publisher,
            &ObjectId::new().to_hex(),
            &ObjectId::new().to_hex(),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());

        let err = accept(
            &store,
            &publisher,
            &instructor_id.to_hex(),
            &ObjectId::new().to_hex(),
        )
        .await
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
