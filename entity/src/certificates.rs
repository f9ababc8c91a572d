use crate::Id;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "certificates";

/// Compound unique index: one certificate per student per class.
pub const STUDENT_CLASS_INDEX: &str = "studentId_1_classId_1";

/// Former unique index on `number`. Numbers may repeat across students, so
/// this index is dropped wherever it still exists.
pub const LEGACY_NUMBER_INDEX: &str = "number_1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Id,

    pub student_id: Id,

    pub class_id: Id,

    pub number: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,

    pub issued_at: DateTime,
}
