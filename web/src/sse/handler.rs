use crate::AppState;
use ::sse::message::{NotificationEnvelope, NOTIFICATIONS_CHANNEL};
use ::sse::ConnectionGuard;
use async_stream::stream;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::Stream;
use log::*;
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt::Display;
use std::future::{self, Future};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

/// Initial state of a per-resource stream, sent right after the handshake.
pub(crate) struct Snapshot {
    pub(crate) event_type: &'static str,
    pub(crate) data: Value,
}

/// GET the general notification stream
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    responses(
        (status = 200, description = "text/event-stream of every broadcast notification"),
    )
)]
pub(crate) async fn notifications_stream(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing general SSE notification stream");
    open_stream(&app_state, NOTIFICATIONS_CHANNEL, future::ready(None))
}

/// Builds a snapshot from the result of a view query. A failed query or
/// serialization is logged and yields no snapshot.
pub(crate) fn snapshot_from<T, E>(
    event_type: &'static str,
    result: Result<T, E>,
) -> Option<Snapshot>
where
    T: Serialize,
    E: Display,
{
    let view = match result {
        Ok(view) => view,
        Err(e) => {
            warn!("Opening '{event_type}' stream without a snapshot: {e}");
            return None;
        }
    };

    match serde_json::to_value(view) {
        Ok(data) => Some(Snapshot { event_type, data }),
        Err(e) => {
            warn!("Failed to serialize '{event_type}' snapshot: {e}");
            None
        }
    }
}

/// Registers a connection on `channel` and returns its event stream.
///
/// The connection is registered before `snapshot` is polled, so a change
/// landing while the snapshot is computed is still delivered after it. The
/// stream starts with the `connection` handshake (carrying the `retry:`
/// hint), then the snapshot if any, then whatever the broadcaster sends,
/// interleaved with `ping` frames. The connection is unregistered when the
/// stream is dropped.
pub(crate) fn open_stream<S>(
    app_state: &AppState,
    channel: &str,
    snapshot: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Future<Output = Option<Snapshot>> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let manager = app_state.sse_manager.clone();
    let connection_id = manager.register_connection(channel, tx);
    let guard = ConnectionGuard::new(manager, connection_id);

    // interval_at panics on a zero period
    let keepalive = app_state.config().sse_keepalive().max(Duration::from_secs(1));
    let retry = app_state.config().sse_retry();

    let stream = stream! {
        let _guard = guard;

        yield Ok(render(&NotificationEnvelope::connected()).retry(retry));

        if let Some(snapshot) = snapshot.await {
            yield Ok(render(&NotificationEnvelope::new(snapshot.event_type, snapshot.data)));
        }

        let mut pings = interval_at(Instant::now() + keepalive, keepalive);
        loop {
            let next = tokio::select! {
                event = rx.recv() => event,
                _ = pings.tick() => Some(Ok(render(&NotificationEnvelope::ping()))),
            };
            match next {
                Some(event) => yield event,
                None => break,
            }
        }
    };

    Sse::new(stream)
}

fn render(envelope: &NotificationEnvelope) -> Event {
    envelope.to_frame().unwrap_or_else(|e| {
        error!("Failed to serialize '{}' envelope: {e}", envelope.event_type);
        Event::default().comment(envelope.event_type.as_str())
    })
}
