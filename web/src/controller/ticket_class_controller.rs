use crate::controller::ApiResponse;
use crate::sse::handler::{open_stream, snapshot_from};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use domain::pending_request::{
    self as PendingRequestApi, PENDING_TICKETS_CHANNEL, PENDING_TICKETS_EVENT,
};
use domain::ticket_class as TicketClassApi;
use futures::Stream;
use log::*;
use std::convert::Infallible;

/// GET student requests waiting for a seat in a ticket class
#[utoipa::path(
    get,
    path = "/api/ticket-classes/pending-requests",
    responses(
        (status = 200, description = "Pending ticket class requests", body = [domain::pending_request::PendingTicketRequest]),
    )
)]
pub async fn pending_requests(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let requests = PendingRequestApi::find_pending_ticket_requests(app_state.db_ref()).await?;
    debug!("Found {} pending ticket request(s)", requests.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), requests)))
}

/// GET live stream of the pending ticket class requests
#[utoipa::path(
    get,
    path = "/api/ticket-classes/pending-requests/stream",
    responses(
        (status = 200, description = "text/event-stream: handshake, snapshot, then recomputed views"),
    )
)]
pub async fn pending_requests_stream(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing pending ticket request stream");
    let db = app_state.db_ref().clone();

    open_stream(&app_state, PENDING_TICKETS_CHANNEL, async move {
        let requests = PendingRequestApi::find_pending_ticket_requests(&db).await;
        snapshot_from(PENDING_TICKETS_EVENT, requests)
    })
}

/// POST enroll the student whose request is pending
#[utoipa::path(
    post,
    path = "/api/ticket-classes/{id}/requests/{student_id}/accept",
    params(
        ("id" = String, Path, description = "Ticket class id"),
        ("student_id" = String, Path, description = "Requesting student id"),
    ),
    responses(
        (status = 200, description = "Student enrolled", body = domain::ticket_class::TicketClassView),
        (status = 400, description = "Request not pending, student enrolled or class full", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown class or request", body = crate::error::ErrorResponse),
        (status = 409, description = "Class changed concurrently", body = crate::error::ErrorResponse),
    )
)]
pub async fn accept_request(
    State(app_state): State<AppState>,
    Path((id, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST accept request of student {student_id} on ticket class {id}");

    let ticket_class = TicketClassApi::accept_request(
        app_state.db_ref(),
        app_state.event_publisher.as_ref(),
        &id,
        &student_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), ticket_class)))
}

/// POST drop a student's request
#[utoipa::path(
    post,
    path = "/api/ticket-classes/{id}/requests/{student_id}/reject",
    params(
        ("id" = String, Path, description = "Ticket class id"),
        ("student_id" = String, Path, description = "Requesting student id"),
    ),
    responses(
        (status = 200, description = "Request removed", body = domain::ticket_class::TicketClassView),
        (status = 404, description = "Unknown class or request", body = crate::error::ErrorResponse),
    )
)]
pub async fn reject_request(
    State(app_state): State<AppState>,
    Path((id, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST reject request of student {student_id} on ticket class {id}");

    let ticket_class = TicketClassApi::reject_request(
        app_state.db_ref(),
        app_state.event_publisher.as_ref(),
        &id,
        &student_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), ticket_class)))
}
