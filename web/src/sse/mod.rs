//! SSE HTTP handlers for the web layer.
//!
//! Only the Axum side of the streams lives here. The broadcaster, connection
//! registry and envelope types are in the `sse` crate.

pub(crate) mod handler;
