use crate::controller::ApiResponse;
use crate::sse::handler::{open_stream, snapshot_from};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use domain::order::{self as OrderApi, PENDING_ORDERS_CHANNEL, PENDING_ORDERS_EVENT};
use futures::Stream;
use log::*;
use std::convert::Infallible;

/// GET orders awaiting completion, newest first
#[utoipa::path(
    get,
    path = "/api/orders/pending",
    responses(
        (status = 200, description = "Pending orders", body = [domain::order::PendingOrder]),
    )
)]
pub async fn pending(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let orders = OrderApi::find_pending(app_state.db_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), orders)))
}

/// GET live stream of the pending orders
#[utoipa::path(
    get,
    path = "/api/orders/pending/stream",
    responses(
        (status = 200, description = "text/event-stream: handshake, snapshot, then recomputed views"),
    )
)]
pub async fn pending_stream(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing pending orders stream");
    let db = app_state.db_ref().clone();

    open_stream(&app_state, PENDING_ORDERS_CHANNEL, async move {
        let orders = OrderApi::find_pending(&db).await;
        snapshot_from(PENDING_ORDERS_EVENT, orders)
    })
}
