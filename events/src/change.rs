//! Database-driven notification path.
//!
//! A [`ChangeFeed`] reports that *something* in a collection changed; a
//! [`ViewProjection`] recomputes the full derived view that clients care about.
//! Feeds never carry document bodies: projections always re-read.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Insert,
    Update,
    Replace,
    Delete,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionChange {
    pub collection: String,
    pub operation: ChangeOperation,
    /// Hex id of the touched document, when the feed reports one.
    pub document_id: Option<String>,
}

#[async_trait]
pub trait ChangeFeed: Send {
    /// Waits for the next change. `None` means the feed is closed for good.
    async fn next_change(&mut self) -> Option<Result<CollectionChange, BoxError>>;
}

#[async_trait]
pub trait ViewProjection: Send + Sync {
    /// Envelope `type` used when the view is broadcast.
    fn event_type(&self) -> &'static str;

    /// SSE channel whose subscribers receive the view.
    fn channel(&self) -> &'static str;

    async fn project(&self) -> Result<Value, BoxError>;
}
