use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Paid at the school; an admin approves the request by hand
    Local,
    /// Paid through the online checkout
    Online,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Local => write!(fmt, "local"),
            PaymentMethod::Online => write!(fmt, "online"),
            PaymentMethod::Unknown => write!(fmt, "unknown"),
        }
    }
}
