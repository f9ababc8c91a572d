//! Server-Sent Events (SSE) infrastructure for real-time admin dashboard updates.
//!
//! # Architecture
//!
//! - **Connection registry**: every open stream (one per browser tab) is
//!   registered on a channel. The general notification stream uses
//!   [`message::NOTIFICATIONS_CHANNEL`]; per-resource streams use the channel
//!   of the view they follow.
//! - **Broadcaster** ([`Manager`]): wraps `(type, data)` into a
//!   [`message::NotificationEnvelope`], writes it to the targeted connections,
//!   prunes connections whose write failed, and feeds registered
//!   [`events::NotificationSink`]s (the admin email side channel).
//! - **Watchers** ([`watcher::Watcher`]): one per watched collection for the
//!   whole process. Each change triggers a full recompute of the view, which
//!   is pushed to that view's channel.
//! - **Ephemeral**: nothing is persisted or replayed. A client that is offline
//!   misses envelopes and reloads fresh data on reconnect.
//!
//! # Delivery
//!
//! A mutation is usually announced twice: once by the explicit domain event
//! published after the write ([`domain_event_handler`]) and once by the watcher
//! that observes the same write. The two use different event types, and every
//! envelope has a unique `id` for client-side de-duplication. Optionally, a
//! recomputed channel view equal to the last one sent on that channel inside
//! the de-duplication window is not sent again.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with a channel index and type-safe ConnectionId
//! - `manager`: the broadcaster and the connection drop guard
//! - `message`: envelope, typed events and scopes
//! - `dedupe`: last-value suppression for recomputed channel views
//! - `watcher`: change feed → projection → channel loop
//! - `domain_event_handler`: explicit domain events → broadcasts

pub mod connection;
pub mod dedupe;
pub mod domain_event_handler;
pub mod manager;
pub mod message;
pub mod watcher;

pub use manager::{ConnectionGuard, Manager};
