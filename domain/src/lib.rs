//! Business rules of the driving school backend.
//!
//! Consumers of the `domain` crate never need `entity_api` directly: the
//! document models, ids and event infrastructure they need are re-exported here.
pub use entity_api::{
    certificates, instructors, order_status, orders, payment_method, request_status,
    schedule_slots, slot_status, ticket_classes, Id,
};

pub use entity_api::change_stream;
pub use events;

pub mod certificate;
pub mod emails;
pub mod error;
pub mod gateway;
pub mod lesson;
pub mod order;
pub mod pending_request;
pub mod schedule;
pub mod store;
pub mod ticket_class;

use mongodb::bson::DateTime;

/// Renders a stored timestamp for API clients.
pub(crate) fn rfc3339(datetime: &DateTime) -> String {
    datetime
        .try_to_rfc3339_string()
        .unwrap_or_else(|_| datetime.timestamp_millis().to_string())
}
