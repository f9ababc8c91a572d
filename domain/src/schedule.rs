//! Instructor schedule slots: overlap detection and conflict-free insertion.

use crate::error::Error;
use crate::store::InstructorStore;
use chrono::{NaiveDate, NaiveTime};
use entity::instructors::{self, Schedule};
use entity::payment_method::PaymentMethod;
use entity::schedule_slots;
use entity::slot_status::SlotStatus;
use entity::Id;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Compare-and-swap attempts before a concurrently edited schedule is reported
/// as a conflict.
pub const MAX_INSERT_ATTEMPTS: u32 = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// A slot as seen by API clients and SSE subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl From<&schedule_slots::Model> for SlotView {
    fn from(slot: &schedule_slots::Model) -> Self {
        Self {
            id: slot.id.to_hex(),
            date: slot.date.clone(),
            start: slot.start.clone(),
            end: slot.end.clone(),
            status: slot.status.to_string(),
            class_type: slot.class_type.clone(),
            student_id: slot.student_id.map(|id| id.to_hex()),
            student_name: slot.student_name.clone(),
            payment_method: slot.payment_method.map(|method| method.to_string()),
            amount: slot.amount,
        }
    }
}

/// A half-open time range `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = parse_time(start)?;
        let end = parse_time(end)?;
        Some(Self { start, end })
    }

    /// Touching ranges (one ends when the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).ok()
}

/// Request to add a slot to one of an instructor's schedules.
#[derive(Debug, Clone, Default)]
pub struct NewSlot {
    pub instructor_id: String,
    pub class_type: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub status: Option<String>,
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub payment_method: Option<String>,
    pub amount: Option<f64>,
}

/// A [`NewSlot`] whose fields have all been checked and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSlot {
    pub instructor_id: Id,
    pub schedule: Schedule,
    pub date: NaiveDate,
    pub range: TimeRange,
    pub status: SlotStatus,
    pub student_id: Option<Id>,
    pub student_name: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub amount: Option<f64>,
}

impl NewSlot {
    pub fn validate(&self) -> Result<ValidSlot, Error> {
        if [
            &self.instructor_id,
            &self.class_type,
            &self.date,
            &self.start,
            &self.end,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err(Error::validation(
                "instructorId, classType, date, start and end are required",
            ));
        }

        let instructor_id = parse_id(&self.instructor_id, "instructorId")?;
        let schedule = Schedule::from_class_type(&self.class_type).ok_or_else(|| {
            Error::validation("classType must be 'driving lesson' or 'driving test'")
        })?;
        let date = parse_date(&self.date)
            .ok_or_else(|| Error::validation("date must be formatted as YYYY-MM-DD"))?;
        let range = TimeRange::parse(&self.start, &self.end)
            .ok_or_else(|| Error::validation("start and end must be formatted as HH:MM"))?;
        if range.start >= range.end {
            return Err(Error::validation("start must be before end"));
        }

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("available") => SlotStatus::Available,
            Some("pending") => SlotStatus::Pending,
            Some("booked") => SlotStatus::Booked,
            Some(other) => {
                return Err(Error::validation(format!(
                    "status '{other}' is not valid for a new slot"
                )))
            }
        };
        let payment_method = match self.payment_method.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("local") => Some(PaymentMethod::Local),
            Some("online") => Some(PaymentMethod::Online),
            Some(other) => {
                return Err(Error::validation(format!(
                    "paymentMethod '{other}' is not supported"
                )))
            }
        };
        let student_id = match self.student_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Some(parse_id(id, "studentId")?),
            _ => None,
        };

        Ok(ValidSlot {
            instructor_id,
            schedule,
            date,
            range,
            status,
            student_id,
            student_name: self.student_name.clone(),
            payment_method,
            amount: self.amount,
        })
    }
}

impl ValidSlot {
    fn to_model(&self) -> schedule_slots::Model {
        schedule_slots::Model {
            id: Id::new(),
            date: self.date.format(DATE_FORMAT).to_string(),
            start: self.range.start.format(TIME_FORMAT).to_string(),
            end: self.range.end.format(TIME_FORMAT).to_string(),
            status: self.status,
            class_type: Some(self.schedule.class_type().to_string()),
            student_id: self.student_id,
            student_name: self.student_name.clone(),
            payment_method: self.payment_method,
            amount: self.amount,
        }
    }
}

pub(crate) fn parse_id(id: &str, field: &str) -> Result<Id, Error> {
    entity_api::object_id_parse_str(id)
        .map_err(|_| Error::validation(format!("{field} is not a valid id")))
}

/// First slot in either schedule that overlaps `range` on `date`.
///
/// Cancelled slots never block. Slots whose stored date or times can't be
/// parsed are skipped.
pub fn find_conflict<'a>(
    instructor: &'a instructors::Model,
    date: NaiveDate,
    range: &TimeRange,
) -> Option<&'a schedule_slots::Model> {
    instructor.all_slots().find(|slot| {
        if slot.status == SlotStatus::Cancelled || parse_date(&slot.date) != Some(date) {
            return false;
        }
        match TimeRange::parse(&slot.start, &slot.end) {
            Some(existing) => existing.overlaps(range),
            None => {
                warn!(
                    "Ignoring slot {} of instructor {} with unreadable times '{}'-'{}'",
                    slot.id, instructor.id, slot.start, slot.end
                );
                false
            }
        }
    })
}

/// Adds a slot unless it overlaps an existing one (409). The write is
/// conditional on the instructor's version, so a concurrent insert forces a
/// fresh check instead of producing overlapping slots.
pub async fn create_slot(
    store: &impl InstructorStore,
    event_publisher: &EventPublisher,
    new_slot: NewSlot,
) -> Result<SlotView, Error> {
    let valid = new_slot.validate()?;

    for attempt in 1..=MAX_INSERT_ATTEMPTS {
        let instructor = store.find_instructor(valid.instructor_id).await?;

        if let Some(existing) = find_conflict(&instructor, valid.date, &valid.range) {
            info!(
                "Rejecting slot {} {}-{} for instructor {}: overlaps slot {}",
                valid.date, valid.range.start, valid.range.end, instructor.id, existing.id
            );
            return Err(Error::conflict(format!(
                "The instructor already has a slot on {} from {} to {}",
                existing.date, existing.start, existing.end
            )));
        }

        let slot = valid.to_model();
        if store
            .push_slot(instructor.id, instructor.version, valid.schedule, &slot)
            .await?
        {
            let view = SlotView::from(&slot);
            event_publisher
                .publish(DomainEvent::ScheduleSlotCreated {
                    instructor_id: instructor.id.to_hex(),
                    slot: serde_json::to_value(&view)?,
                })
                .await;
            return Ok(view);
        }

        warn!(
            "Schedule of instructor {} changed during slot insert (attempt {attempt}/{MAX_INSERT_ATTEMPTS})",
            instructor.id
        );
    }

    Err(Error::conflict(
        "The instructor's schedule is being changed by someone else, please retry",
    ))
}
