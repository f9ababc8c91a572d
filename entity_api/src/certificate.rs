use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};

use super::error::Error;
use entity::certificates::{Model, COLLECTION};
use entity::Id;
use log::*;

fn collection(db: &Database) -> Collection<Model> {
    db.collection(COLLECTION)
}

pub async fn create(db: &Database, certificate: Model) -> Result<Model, Error> {
    debug!("New Certificate to be inserted: {certificate:?}");

    collection(db).insert_one(&certificate).await?;
    Ok(certificate)
}

pub async fn find_by_student(db: &Database, student_id: Id) -> Result<Vec<Model>, Error> {
    let cursor = collection(db)
        .find(doc! { "studentId": student_id })
        .sort(doc! { "number": 1 })
        .await?;
    Ok(cursor.try_collect().await?)
}

/// Highest certificate number issued so far, if any.
pub async fn max_number(db: &Database) -> Result<Option<i64>, Error> {
    let highest = collection(db)
        .find_one(doc! {})
        .sort(doc! { "number": -1 })
        .await?;
    Ok(highest.map(|certificate| certificate.number))
}
