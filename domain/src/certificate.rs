use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::rfc3339;
use crate::schedule::parse_id;
use crate::store::CertificateStore;
use entity::certificates;
use entity::Id;
use events::{DomainEvent, EventPublisher};
use log::*;
use mongodb::bson::DateTime;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView {
    #[serde(rename = "_id")]
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,
    pub issued_at: String,
}

impl From<&certificates::Model> for CertificateView {
    fn from(certificate: &certificates::Model) -> Self {
        Self {
            id: certificate.id.to_hex(),
            student_id: certificate.student_id.to_hex(),
            class_id: certificate.class_id.to_hex(),
            number: certificate.number,
            class_type: certificate.class_type.clone(),
            issued_at: rfc3339(&certificate.issued_at),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCertificate {
    pub student_id: String,
    pub class_id: String,
    /// Assigned automatically when absent.
    pub number: Option<i64>,
    pub class_type: Option<String>,
}

/// The number following the highest one issued so far; numbering starts at 1.
pub fn next_number(highest: Option<i64>) -> i64 {
    highest.map_or(1, |n| n.max(0) + 1)
}

/// Issues a certificate. A student holds at most one certificate per class;
/// certificate numbers on their own are not unique.
pub async fn issue(
    store: &impl CertificateStore,
    event_publisher: &EventPublisher,
    new_certificate: NewCertificate,
) -> Result<CertificateView, Error> {
    let student_id = parse_id(&new_certificate.student_id, "studentId")?;
    let class_id = parse_id(&new_certificate.class_id, "classId")?;

    let number = match new_certificate.number {
        Some(number) if number < 1 => {
            return Err(Error::validation("number must be a positive integer"))
        }
        Some(number) => number,
        None => next_number(store.max_certificate_number().await?),
    };

    let model = certificates::Model {
        id: Id::new(),
        student_id,
        class_id,
        number,
        class_type: new_certificate
            .class_type
            .filter(|class_type| !class_type.trim().is_empty()),
        issued_at: DateTime::now(),
    };

    let created = store
        .insert_certificate(model)
        .await
        .map_err(Error::from)
        .map_err(|err| {
            if is_duplicate(&err) {
                info!("Certificate for student {student_id} and class {class_id} already exists");
                Error::conflict("A certificate already exists for this student and class")
            } else {
                err
            }
        })?;

    let view = CertificateView::from(&created);
    info!(
        "Issued certificate #{} to student {student_id} for class {class_id}",
        view.number
    );
    event_publisher
        .publish(DomainEvent::CertificateIssued {
            certificate: serde_json::to_value(&view)?,
        })
        .await;

    Ok(view)
}

pub async fn find_by_student(
    store: &impl CertificateStore,
    student_id: &str,
) -> Result<Vec<CertificateView>, Error> {
    let student_id = parse_id(student_id, "student_id")?;
    let certificates = store.find_certificates(student_id).await?;
    Ok(certificates.iter().map(CertificateView::from).collect())
}

fn is_duplicate(err: &Error) -> bool {
    err.error_kind
        == DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Duplicate))
}
