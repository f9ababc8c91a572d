use mongodb::bson::oid::ObjectId;

// Persisted documents
pub mod certificates;
pub mod instructors;
pub mod orders;
pub mod schedule_slots;
pub mod ticket_classes;

// Embedded value types
pub mod order_status;
pub mod payment_method;
pub mod request_status;
pub mod slot_status;

/// A type alias that represents any document's `_id` field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = ObjectId;
