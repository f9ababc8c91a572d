//! Typed parameters for endpoint inputs.
//!
//! Request bodies keep every field optional so that a missing field reaches
//! the domain validation and comes back as a `400` with a readable message,
//! instead of being rejected by the JSON extractor.

pub(crate) mod certificate;
pub(crate) mod notification;
pub(crate) mod schedule;
