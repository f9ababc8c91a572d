use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};

use super::error::Error;
use entity::order_status::OrderStatus;
use entity::orders::{Model, COLLECTION};

fn collection(db: &Database) -> Collection<Model> {
    db.collection(COLLECTION)
}

/// Orders awaiting completion, newest first.
pub async fn find_pending(db: &Database) -> Result<Vec<Model>, Error> {
    let cursor = collection(db)
        .find(doc! { "status": OrderStatus::Pending.as_str() })
        .sort(doc! { "createdAt": -1 })
        .await?;
    Ok(cursor.try_collect().await?)
}
