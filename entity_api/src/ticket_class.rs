use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use super::error::Error;
use entity::request_status::RequestStatus;
use entity::ticket_classes::{Model, COLLECTION};
use entity::Id;
use log::*;

fn collection(db: &Database) -> Collection<Model> {
    db.collection(COLLECTION)
}

pub async fn find_all(db: &Database) -> Result<Vec<Model>, Error> {
    let cursor = collection(db).find(doc! {}).await?;
    Ok(cursor.try_collect().await?)
}

/// Classes with at least one request still awaiting a decision.
pub async fn find_with_pending_requests(db: &Database) -> Result<Vec<Model>, Error> {
    let cursor = collection(db)
        .find(doc! { "studentRequests.status": RequestStatus::Pending.as_str() })
        .sort(doc! { "date": 1, "hour": 1 })
        .await?;
    Ok(cursor.try_collect().await?)
}

pub async fn find_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    collection(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| {
            error!("Ticket class with id {id} not found");
            Error::not_found()
        })
}

/// Enrolls the student and removes their request in one write. The write
/// only applies while the request is pending, the student is not yet
/// enrolled and a seat is free; otherwise `None` is returned.
pub async fn accept_request(
    db: &Database,
    ticket_class_id: Id,
    student_id: Id,
) -> Result<Option<Model>, Error> {
    let filter = doc! {
        "_id": ticket_class_id,
        "studentRequests": {
            "$elemMatch": { "studentId": student_id, "status": RequestStatus::Pending.as_str() }
        },
        "students.studentId": { "$ne": student_id },
        "$expr": { "$lt": [ { "$size": { "$ifNull": [ "$students", [] ] } }, "$spots" ] },
    };
    let update = doc! {
        "$pull": { "studentRequests": { "studentId": student_id } },
        "$push": { "students": { "studentId": student_id, "enrolledAt": DateTime::now() } },
    };

    Ok(collection(db)
        .find_one_and_update(filter, update)
        .return_document(ReturnDocument::After)
        .await?)
}

/// Removes the student's request. `None` when there was no such request.
pub async fn reject_request(
    db: &Database,
    ticket_class_id: Id,
    student_id: Id,
) -> Result<Option<Model>, Error> {
    let filter = doc! {
        "_id": ticket_class_id,
        "studentRequests.studentId": student_id,
    };
    let update = doc! {
        "$pull": { "studentRequests": { "studentId": student_id } },
    };

    Ok(collection(db)
        .find_one_and_update(filter, update)
        .return_document(ReturnDocument::After)
        .await?)
}
