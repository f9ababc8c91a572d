use mongodb::bson::{doc, DateTime};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

pub use entity::{
    certificates, instructors, order_status, orders, payment_method, request_status,
    schedule_slots, slot_status, ticket_classes, Id,
};

pub mod certificate;
pub mod change_stream;
pub mod error;
pub mod instructor;
pub mod order;
pub mod ticket_class;

use log::*;

/// Parses a 24-character hex string into a document id.
pub fn object_id_parse_str(id_str: &str) -> Result<Id, error::Error> {
    Id::parse_str(id_str.trim()).map_err(|_| error::Error {
        source: None,
        error_kind: error::EntityApiErrorKind::InvalidQueryTerm,
    })
}

/// Brings the indexes this service relies on into the expected shape.
///
/// The legacy unique index on certificate `number` is dropped so that numbers
/// may repeat across students; uniqueness is per `(studentId, classId)`.
pub async fn ensure_indexes(db: &Database) -> Result<(), error::Error> {
    let certificates = db.collection::<certificates::Model>(certificates::COLLECTION);

    // Listing fails when the collection doesn't exist yet
    let existing = match certificates.list_index_names().await {
        Ok(names) => names,
        Err(e) => {
            debug!("Could not list certificate indexes ({e}), assuming none");
            Vec::new()
        }
    };

    if existing
        .iter()
        .any(|name| name == certificates::LEGACY_NUMBER_INDEX)
    {
        warn!(
            "Dropping legacy index {} on {}",
            certificates::LEGACY_NUMBER_INDEX,
            certificates::COLLECTION
        );
        certificates
            .drop_index(certificates::LEGACY_NUMBER_INDEX)
            .await?;
    }

    let student_class = IndexModel::builder()
        .keys(doc! { "studentId": 1, "classId": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name(certificates::STUDENT_CLASS_INDEX.to_string())
                .build(),
        )
        .build();
    certificates.create_index(student_class).await?;
    info!(
        "Ensured unique index {} on {}",
        certificates::STUDENT_CLASS_INDEX,
        certificates::COLLECTION
    );

    Ok(())
}

/// Inserts a small, self-consistent data set for local development.
pub async fn seed_database(db: &Database) -> Result<(), error::Error> {
    use payment_method::PaymentMethod;
    use slot_status::SlotStatus;

    let student_luis = Id::new();
    let student_marta = Id::new();
    let student_pablo = Id::new();

    let slot = |date: &str, start: &str, end: &str, status: SlotStatus| schedule_slots::Model {
        id: Id::new(),
        date: date.to_owned(),
        start: start.to_owned(),
        end: end.to_owned(),
        status,
        class_type: None,
        student_id: None,
        student_name: None,
        payment_method: None,
        amount: None,
    };

    let ana = instructors::Model {
        id: Id::new(),
        name: "Ana Torres".to_owned(),
        email: Some("ana.torres@drivingschool.com".to_owned()),
        dni: Some("48211934K".to_owned()),
        version: 0,
        schedule_driving_test: vec![slot("2025-03-01", "08:00", "09:00", SlotStatus::Available)],
        schedule_driving_lesson: vec![
            slot("2025-03-01", "09:00", "10:00", SlotStatus::Available),
            schedule_slots::Model {
                class_type: Some("driving lesson".to_owned()),
                student_id: Some(student_luis),
                student_name: Some("Luis Gómez".to_owned()),
                payment_method: Some(PaymentMethod::Local),
                amount: Some(60.0),
                ..slot("2025-03-01", "10:00", "11:00", SlotStatus::Pending)
            },
            schedule_slots::Model {
                class_type: Some("driving lesson".to_owned()),
                student_id: Some(student_marta),
                student_name: Some("Marta Díaz".to_owned()),
                payment_method: Some(PaymentMethod::Online),
                amount: Some(60.0),
                ..slot("2025-03-02", "10:00", "11:00", SlotStatus::Booked)
            },
        ],
    };

    let carlos = instructors::Model {
        id: Id::new(),
        name: "Carlos Ruiz".to_owned(),
        email: Some("carlos.ruiz@drivingschool.com".to_owned()),
        dni: None,
        version: 0,
        schedule_driving_test: Vec::new(),
        schedule_driving_lesson: vec![slot("2025-03-03", "14:00", "15:30", SlotStatus::Available)],
    };

    db.collection::<instructors::Model>(instructors::COLLECTION)
        .insert_many([&ana, &carlos])
        .await?;

    let bdi = ticket_classes::Model {
        id: Id::new(),
        date: "2025-03-08".to_owned(),
        hour: "08:00".to_owned(),
        end_hour: Some("12:00".to_owned()),
        class_type: "bdi".to_owned(),
        location_id: None,
        instructor_id: Some(ana.id),
        spots: 20,
        students: vec![ticket_classes::EnrolledStudent {
            student_id: student_marta,
            enrolled_at: Some(DateTime::now()),
        }],
        student_requests: vec![ticket_classes::StudentRequest {
            student_id: student_pablo,
            request_date: Some(DateTime::now()),
            status: request_status::RequestStatus::Pending,
            payment_method: Some(PaymentMethod::Local),
        }],
    };

    db.collection::<ticket_classes::Model>(ticket_classes::COLLECTION)
        .insert_one(&bdi)
        .await?;

    let order = orders::Model {
        id: Id::new(),
        user_id: student_luis,
        order_number: "ORD-0001".to_owned(),
        items: vec![orders::OrderItem {
            id: "pkg-10-lessons".to_owned(),
            title: "10 driving lessons".to_owned(),
            price: 550.0,
            quantity: 1,
        }],
        total: 550.0,
        status: order_status::OrderStatus::Pending,
        payment_method: Some(PaymentMethod::Local),
        created_at: DateTime::now(),
    };

    db.collection::<orders::Model>(orders::COLLECTION)
        .insert_one(&order)
        .await?;

    info!(
        "Seeded instructors {} and {}, ticket class {}, order {}",
        ana.id, carlos.id, bdi.id, order.order_number
    );
    Ok(())
}
