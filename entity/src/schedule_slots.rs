//! A slot embedded in one of an instructor's schedule arrays.

use crate::payment_method::PaymentMethod;
use crate::slot_status::SlotStatus;
use crate::Id;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "_id")]
    pub id: Id,

    /// Calendar day, `YYYY-MM-DD`
    pub date: String,

    /// Local start time, `HH:MM`
    pub start: String,

    /// Local end time, `HH:MM`
    pub end: String,

    #[serde(default)]
    pub status: SlotStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Model {
    pub fn is_pending_local_payment(&self) -> bool {
        self.status == SlotStatus::Pending && self.payment_method == Some(PaymentMethod::Local)
    }
}
