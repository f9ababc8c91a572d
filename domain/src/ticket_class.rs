use crate::error::Error;
use crate::rfc3339;
use crate::schedule::parse_id;
use crate::store::TicketClassStore;
use entity::request_status::RequestStatus;
use entity::ticket_classes;
use entity::Id;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketClassView {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: String,
    pub hour: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_hour: Option<String>,
    #[serde(rename = "type")]
    pub class_type: String,
    pub spots: i32,
    pub students: Vec<EnrolledStudentView>,
    pub student_requests: Vec<StudentRequestView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudentView {
    pub student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRequestView {
    pub student_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl From<&ticket_classes::Model> for TicketClassView {
    fn from(class: &ticket_classes::Model) -> Self {
        Self {
            id: class.id.to_hex(),
            date: class.date.clone(),
            hour: class.hour.clone(),
            end_hour: class.end_hour.clone(),
            class_type: class.class_type.clone(),
            spots: class.spots,
            students: class
                .students
                .iter()
                .map(|student| EnrolledStudentView {
                    student_id: student.student_id.to_hex(),
                    enrolled_at: student.enrolled_at.as_ref().map(rfc3339),
                })
                .collect(),
            student_requests: class
                .student_requests
                .iter()
                .map(|request| StudentRequestView {
                    student_id: request.student_id.to_hex(),
                    status: request.status.to_string(),
                    request_date: request.request_date.as_ref().map(rfc3339),
                    payment_method: request.payment_method.map(|method| method.to_string()),
                })
                .collect(),
        }
    }
}

/// Checks every precondition for moving `student_id` from the request list
/// into the class.
pub fn check_acceptable(class: &ticket_classes::Model, student_id: &Id) -> Result<(), Error> {
    let request = class.find_request(student_id).ok_or_else(|| {
        warn!(
            "No request from student {student_id} on ticket class {}",
            class.id
        );
        Error::not_found()
    })?;

    if request.status != RequestStatus::Pending {
        return Err(Error::validation(format!(
            "Only pending requests can be accepted (current status: {})",
            request.status
        )));
    }
    if class.is_enrolled(student_id) {
        return Err(Error::validation(
            "The student is already enrolled in this class",
        ));
    }
    if !class.has_free_spot() {
        return Err(Error::validation("The class has no free spots left"));
    }
    Ok(())
}

pub async fn accept_request(
    store: &impl TicketClassStore,
    event_publisher: &EventPublisher,
    ticket_class_id: &str,
    student_id: &str,
) -> Result<TicketClassView, Error> {
    let ticket_class_id = parse_id(ticket_class_id, "ticketClassId")?;
    let student_id = parse_id(student_id, "studentId")?;

    let current = store.find_ticket_class(ticket_class_id).await?;
    check_acceptable(&current, &student_id)?;

    let updated = store
        .accept_request(ticket_class_id, student_id)
        .await?
        .ok_or_else(|| {
            Error::conflict("The ticket class changed while accepting the request, please retry")
        })?;
    info!("Student {student_id} enrolled in ticket class {ticket_class_id}");

    let view = TicketClassView::from(&updated);
    event_publisher
        .publish(DomainEvent::TicketRequestAccepted {
            ticket_class_id: ticket_class_id.to_hex(),
            student_id: student_id.to_hex(),
            ticket_class: serde_json::to_value(&view)?,
        })
        .await;

    Ok(view)
}

pub async fn reject_request(
    store: &impl TicketClassStore,
    event_publisher: &EventPublisher,
    ticket_class_id: &str,
    student_id: &str,
) -> Result<TicketClassView, Error> {
    let ticket_class_id = parse_id(ticket_class_id, "ticketClassId")?;
    let student_id = parse_id(student_id, "studentId")?;

    let current = store.find_ticket_class(ticket_class_id).await?;
    if current.find_request(&student_id).is_none() {
        warn!("No request from student {student_id} on ticket class {ticket_class_id}");
        return Err(Error::not_found());
    }

    let updated = store
        .reject_request(ticket_class_id, student_id)
        .await?
        .ok_or_else(Error::not_found)?;
    info!("Request of student {student_id} on ticket class {ticket_class_id} rejected");

    event_publisher
        .publish(DomainEvent::TicketRequestRejected {
            ticket_class_id: ticket_class_id.to_hex(),
            student_id: student_id.to_hex(),
        })
        .await;

    Ok(TicketClassView::from(&updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use crate::store::memory::{recording_publisher, InMemoryStore};
    use entity::ticket_classes::{EnrolledStudent, StudentRequest};
    use mongodb::bson::oid::ObjectId;

    fn class(
        spots: i32,
        enrolled: Vec<Id>,
        requests: Vec<(Id, RequestStatus)>,
    ) -> ticket_classes::Model {
        ticket_classes::Model {
            id: ObjectId::new(),
            date: "2025-03-08".to_string(),
            hour: "08:00".to_string(),
            end_hour: None,
            class_type: "adi".to_string(),
            location_id: None,
            instructor_id: None,
            spots,
            students: enrolled
                .into_iter()
                .map(|student_id| EnrolledStudent {
                    student_id,
                    enrolled_at: None,
                })
                .collect(),
            student_requests: requests
                .into_iter()
                .map(|(student_id, status)| StudentRequest {
                    student_id,
                    request_date: None,
                    status,
                    payment_method: None,
                })
                .collect(),
        }
    }

    fn is_validation(err: &Error) -> bool {
        matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        )
    }

    #[test]
    fn test_pending_request_with_free_spot_is_acceptable() {
        let student = ObjectId::new();
        let class = class(2, vec![ObjectId::new()], vec![(student, RequestStatus::Pending)]);
        assert!(check_acceptable(&class, &student).is_ok());
    }

    #[test]
    fn test_missing_request_is_not_found() {
        let class = class(2, vec![], vec![]);
        assert!(check_acceptable(&class, &ObjectId::new())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_decided_request_enrolled_student_and_full_class_are_rejected() {
        let student = ObjectId::new();

        let decided = class(2, vec![], vec![(student, RequestStatus::Rejected)]);
        assert!(is_validation(&check_acceptable(&decided, &student).unwrap_err()));

        let enrolled = class(2, vec![student], vec![(student, RequestStatus::Pending)]);
        assert!(is_validation(&check_acceptable(&enrolled, &student).unwrap_err()));

        let full = class(1, vec![ObjectId::new()], vec![(student, RequestStatus::Pending)]);
        assert!(is_validation(&check_acceptable(&full, &student).unwrap_err()));
    }

    #[test]
    fn test_view_renders_hex_ids() {
        let student = ObjectId::new();
        let model = class(3, vec![student], vec![]);
        let json = serde_json::to_value(TicketClassView::from(&model)).unwrap();

        assert_eq!(json["_id"], model.id.to_hex());
        assert_eq!(json["type"], "adi");
        assert_eq!(json["students"][0]["studentId"], student.to_hex());
        assert_eq!(json["studentRequests"], serde_json::json!([]));
    }

    fn store_with(class: ticket_classes::Model) -> InMemoryStore {
        let store = InMemoryStore::default();
        store.ticket_classes.lock().unwrap().push(class);
        store
    }

    #[tokio::test]
    async fn test_accept_moves_request_into_students() {
        let student = ObjectId::new();
        let other = ObjectId::new();
        let model = class(
            2,
            vec![],
            vec![(student, RequestStatus::Pending), (other, RequestStatus::Pending)],
        );
        let class_id = model.id;
        let store = store_with(model);
        let (publisher, events) = recording_publisher();

        let view = accept_request(&store, &publisher, &class_id.to_hex(), &student.to_hex())
            .await
            .unwrap();

        assert_eq!(view.students.len(), 1);
        assert_eq!(view.students[0].student_id, student.to_hex());
        assert!(view.students[0].enrolled_at.is_some());
        assert_eq!(view.student_requests.len(), 1);
        assert_eq!(view.student_requests[0].student_id, other.to_hex());
        assert_eq!(*events.names.lock().unwrap(), vec!["TicketRequestAccepted"]);
    }

    #[tokio::test]
    async fn test_pending_request_is_accepted_despite_an_older_rejected_one() {
        let student = ObjectId::new();
        let model = class(
            1,
            vec![],
            vec![
                (student, RequestStatus::Rejected),
                (student, RequestStatus::Pending),
            ],
        );
        let class_id = model.id;
        let store = store_with(model);
        let (publisher, _) = recording_publisher();

        let view = accept_request(&store, &publisher, &class_id.to_hex(), &student.to_hex())
            .await
            .unwrap();

        assert_eq!(view.students.len(), 1);
        assert!(view.student_requests.is_empty());
    }

    #[tokio::test]
    async fn test_class_filled_concurrently_is_a_conflict() {
        let student = ObjectId::new();
        let model = class(1, vec![], vec![(student, RequestStatus::Pending)]);
        let class_id = model.id;
        let store = store_with(model);
        store
            .concurrent_enrollments
            .lock()
            .unwrap()
            .push(ObjectId::new());
        let (publisher, events) = recording_publisher();

        let err = accept_request(&store, &publisher, &class_id.to_hex(), &student.to_hex())
            .await
            .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Conflict(_))
        ));
        assert!(events.names.lock().unwrap().is_empty());
        assert_eq!(store.ticket_class(class_id).student_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_full_class_is_rejected_before_writing() {
        let student = ObjectId::new();
        let model = class(
            1,
            vec![ObjectId::new()],
            vec![(student, RequestStatus::Pending)],
        );
        let class_id = model.id;
        let store = store_with(model);
        let (publisher, _) = recording_publisher();

        let err = accept_request(&store, &publisher, &class_id.to_hex(), &student.to_hex())
            .await
            .unwrap_err();

        assert!(is_validation(&err));
        assert_eq!(store.ticket_class(class_id).students.len(), 1);
    }

    #[tokio::test]
    async fn test_reject_drops_request_and_unknown_request_is_not_found() {
        let student = ObjectId::new();
        let model = class(2, vec![], vec![(student, RequestStatus::Pending)]);
        let class_id = model.id;
        let store = store_with(model);
        let (publisher, events) = recording_publisher();

        let view = reject_request(&store, &publisher, &class_id.to_hex(), &student.to_hex())
            .await
            .unwrap();
        assert!(view.student_requests.is_empty());
        assert!(view.students.is_empty());
        assert_eq!(*events.names.lock().unwrap(), vec!["TicketRequestRejected"]);

        let err = reject_request(&store, &publisher, &class_id.to_hex(), &student.to_hex())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
