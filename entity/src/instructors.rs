use crate::schedule_slots;
use crate::Id;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "instructors";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Id,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,

    /// Bumped on every schedule write; slot inserts are conditional on it.
    #[serde(default)]
    pub version: i64,

    #[serde(default)]
    pub schedule_driving_test: Vec<schedule_slots::Model>,

    #[serde(default)]
    pub schedule_driving_lesson: Vec<schedule_slots::Model>,
}

/// Which embedded schedule array a slot lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    DrivingLesson,
    DrivingTest,
}

impl Schedule {
    /// Maps the API's `classType` value.
    pub fn from_class_type(class_type: &str) -> Option<Self> {
        match class_type.trim().to_lowercase().as_str() {
            "driving lesson" => Some(Schedule::DrivingLesson),
            "driving test" => Some(Schedule::DrivingTest),
            _ => None,
        }
    }

    pub fn class_type(&self) -> &'static str {
        match self {
            Schedule::DrivingLesson => "driving lesson",
            Schedule::DrivingTest => "driving test",
        }
    }

    /// Name of the document field holding this schedule.
    pub fn field_name(&self) -> &'static str {
        match self {
            Schedule::DrivingLesson => "schedule_driving_lesson",
            Schedule::DrivingTest => "schedule_driving_test",
        }
    }
}

impl Model {
    /// Every slot across both schedules.
    pub fn all_slots(&self) -> impl Iterator<Item = &schedule_slots::Model> {
        self.schedule_driving_test
            .iter()
            .chain(self.schedule_driving_lesson.iter())
    }

    pub fn find_lesson(&self, lesson_id: &Id) -> Option<&schedule_slots::Model> {
        self.schedule_driving_lesson
            .iter()
            .find(|slot| &slot.id == lesson_id)
    }
}
