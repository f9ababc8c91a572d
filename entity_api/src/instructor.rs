use futures::TryStreamExt;
use mongodb::bson::{doc, to_bson, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use super::error::Error;
use entity::instructors::{Model, Schedule, COLLECTION};
use entity::schedule_slots;
use entity::slot_status::SlotStatus;
use entity::Id;
use log::*;

fn collection(db: &Database) -> Collection<Model> {
    db.collection(COLLECTION)
}

pub async fn find_all(db: &Database) -> Result<Vec<Model>, Error> {
    let cursor = collection(db).find(doc! {}).await?;
    Ok(cursor.try_collect().await?)
}

pub async fn find_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    collection(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| {
            error!("Instructor with id {id} not found");
            Error::not_found()
        })
}

/// Appends `slot` to the given schedule only if the instructor document is
/// still at `expected_version`, bumping the version on success.
///
/// Returns `false` when another writer got there first.
pub async fn push_slot(
    db: &Database,
    instructor_id: Id,
    expected_version: i64,
    schedule: Schedule,
    slot: &schedule_slots::Model,
) -> Result<bool, Error> {
    let field = schedule.field_name();
    let update = doc! {
        "$push": { field: to_bson(slot)? },
        "$inc": { "version": 1_i64 },
    };

    let result = collection(db)
        .update_one(version_filter(instructor_id, expected_version), update)
        .await?;

    debug!(
        "Slot push on instructor {instructor_id} at version {expected_version}: matched {}",
        result.matched_count
    );
    Ok(result.matched_count == 1)
}

/// Moves one driving lesson from `from` to `to` in a single write. Returns
/// `None` when no lesson with that id is currently in state `from`.
pub async fn update_lesson_status(
    db: &Database,
    instructor_id: Id,
    lesson_id: Id,
    from: SlotStatus,
    to: SlotStatus,
) -> Result<Option<Model>, Error> {
    let field = Schedule::DrivingLesson.field_name();
    let status_path = format!("{field}.$.status");

    let filter = doc! {
        "_id": instructor_id,
        field: { "$elemMatch": { "_id": lesson_id, "status": from.as_str() } },
    };
    let update = doc! {
        "$set": { status_path: to.as_str() },
        "$inc": { "version": 1_i64 },
    };

    Ok(collection(db)
        .find_one_and_update(filter, update)
        .return_document(ReturnDocument::After)
        .await?)
}

// Documents written before versioning have no `version` field; they count as 0.
fn version_filter(instructor_id: Id, version: i64) -> Document {
    if version == 0 {
        doc! {
            "_id": instructor_id,
            "$or": [ { "version": 0_i64 }, { "version": { "$exists": false } } ],
        }
    } else {
        doc! { "_id": instructor_id, "version": version }
    }
}
