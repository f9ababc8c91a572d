//! Response DTOs that are not domain views.

pub(crate) mod notification;
