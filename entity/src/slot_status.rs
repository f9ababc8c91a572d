use serde::{Deserialize, Serialize};

/// Lifecycle of an instructor schedule slot.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// Open for booking
    #[default]
    Available,
    /// A student asked for the slot and an admin has to decide
    Pending,
    /// Confirmed for a student
    Booked,
    /// Rejected or called off; no longer blocks the time range
    Cancelled,
    /// Any value written by other tools that this service doesn't know
    #[serde(other)]
    Unknown,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Pending => "pending",
            SlotStatus::Booked => "booked",
            SlotStatus::Cancelled => "cancelled",
            SlotStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}
