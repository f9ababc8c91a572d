//! MongoDB change streams exposed as [`events::ChangeFeed`]s.

use async_trait::async_trait;
use events::{BoxError, ChangeFeed, ChangeOperation, CollectionChange};
use futures::StreamExt;
use mongodb::bson::Document;
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType};
use mongodb::change_stream::ChangeStream;
use mongodb::Database;

use super::error::Error;
use log::*;

pub struct MongoChangeFeed {
    collection: String,
    stream: ChangeStream<ChangeStreamEvent<Document>>,
}

impl MongoChangeFeed {
    /// Opens a change stream over every write to `collection`. Requires a
    /// replica set or sharded cluster.
    pub async fn open(db: &Database, collection: &str) -> Result<Self, Error> {
        let stream = db.collection::<Document>(collection).watch().await?;
        info!("Opened change stream on {}.{collection}", db.name());

        Ok(Self {
            collection: collection.to_string(),
            stream,
        })
    }
}

#[async_trait]
impl ChangeFeed for MongoChangeFeed {
    async fn next_change(&mut self) -> Option<Result<CollectionChange, BoxError>> {
        match self.stream.next().await? {
            Ok(event) => Some(Ok(CollectionChange {
                collection: self.collection.clone(),
                operation: operation_of(&event.operation_type),
                document_id: event
                    .document_key
                    .as_ref()
                    .and_then(|key| key.get_object_id("_id").ok())
                    .map(|id| id.to_hex()),
            })),
            Err(e) => Some(Err(Box::new(e))),
        }
    }
}

fn operation_of(operation_type: &OperationType) -> ChangeOperation {
    match operation_type {
        OperationType::Insert => ChangeOperation::Insert,
        OperationType::Update => ChangeOperation::Update,
        OperationType::Replace => ChangeOperation::Replace,
        OperationType::Delete => ChangeOperation::Delete,
        _ => ChangeOperation::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_writes_map_to_their_operation() {
        assert_eq!(operation_of(&OperationType::Insert), ChangeOperation::Insert);
        assert_eq!(operation_of(&OperationType::Update), ChangeOperation::Update);
        assert_eq!(operation_of(&OperationType::Replace), ChangeOperation::Replace);
        assert_eq!(operation_of(&OperationType::Delete), ChangeOperation::Delete);
    }

    #[test]
    fn test_collection_level_events_map_to_other() {
        assert_eq!(operation_of(&OperationType::Drop), ChangeOperation::Other);
        assert_eq!(operation_of(&OperationType::Invalidate), ChangeOperation::Other);
    }
}
