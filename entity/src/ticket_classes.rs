use crate::payment_method::PaymentMethod;
use crate::request_status::RequestStatus;
use crate::Id;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "ticketclasses";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Id,

    /// `YYYY-MM-DD`
    pub date: String,

    /// `HH:MM`
    pub hour: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_hour: Option<String>,

    /// Course kind, e.g. "date", "bdi", "adi"
    #[serde(rename = "type")]
    pub class_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<Id>,

    /// Seat capacity
    #[serde(default)]
    pub spots: i32,

    #[serde(default)]
    pub students: Vec<EnrolledStudent>,

    #[serde(default)]
    pub student_requests: Vec<StudentRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudent {
    pub student_id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRequest {
    pub student_id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date: Option<DateTime>,

    #[serde(default)]
    pub status: RequestStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl Model {
    pub fn is_enrolled(&self, student_id: &Id) -> bool {
        self.students.iter().any(|s| &s.student_id == student_id)
    }

    /// The student's pending request if they have one, otherwise their most
    /// recent request in any status.
    pub fn find_request(&self, student_id: &Id) -> Option<&StudentRequest> {
        let mut requests = self
            .student_requests
            .iter()
            .filter(|r| &r.student_id == student_id);
        requests
            .clone()
            .find(|r| r.status == RequestStatus::Pending)
            .or_else(|| requests.next_back())
    }

    pub fn has_free_spot(&self) -> bool {
        (self.students.len() as i64) < i64::from(self.spots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, from_document, oid::ObjectId};

    #[test]
    fn test_capacity_and_lookup_helpers() {
        let enrolled = ObjectId::new();
        let requester = ObjectId::new();
        let class: Model = from_document(doc! {
            "_id": ObjectId::new(),
            "date": "2025-03-08",
            "hour": "08:00",
            "type": "bdi",
            "spots": 2,
            "students": [{ "studentId": enrolled }],
            "studentRequests": [{ "studentId": requester, "status": "pending" }],
        })
        .unwrap();

        assert!(class.is_enrolled(&enrolled));
        assert!(!class.is_enrolled(&requester));
        assert_eq!(
            class.find_request(&requester).map(|r| r.status),
            Some(RequestStatus::Pending)
        );
        assert!(class.has_free_spot());
    }

    #[test]
    fn test_zero_spots_is_full() {
        let class: Model = from_document(doc! {
            "_id": ObjectId::new(),
            "date": "2025-03-08",
            "hour": "08:00",
            "type": "date",
        })
        .unwrap();

        assert!(!class.has_free_spot());
    }

    #[test]
    fn test_pending_request_wins_over_older_decided_ones() {
        let student = ObjectId::new();
        let class: Model = from_document(doc! {
            "_id": ObjectId::new(),
            "date": "2025-03-08",
            "hour": "08:00",
            "type": "bdi",
            "spots": 2,
            "studentRequests": [
                { "studentId": student, "status": "rejected" },
                { "studentId": ObjectId::new(), "status": "pending" },
                { "studentId": student, "status": "pending" },
                { "studentId": student, "status": "accepted" },
            ],
        })
        .unwrap();

        assert_eq!(
            class.find_request(&student).map(|r| r.status),
            Some(RequestStatus::Pending)
        );
    }

    #[test]
    fn test_latest_request_is_used_when_none_is_pending() {
        let student = ObjectId::new();
        let class: Model = from_document(doc! {
            "_id": ObjectId::new(),
            "date": "2025-03-08",
            "hour": "08:00",
            "type": "bdi",
            "studentRequests": [
                { "studentId": student, "status": "rejected" },
                { "studentId": student, "status": "accepted" },
            ],
        })
        .unwrap();

        assert_eq!(
            class.find_request(&student).map(|r| r.status),
            Some(RequestStatus::Accepted)
        );
        assert!(class.find_request(&ObjectId::new()).is_none());
    }
}
