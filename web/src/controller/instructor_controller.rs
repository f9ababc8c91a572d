use crate::controller::ApiResponse;
use crate::extractors::JsonBody;
use crate::params::schedule::CreateParams;
use crate::sse::handler::{open_stream, snapshot_from};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use domain::pending_request::{
    self as PendingRequestApi, PENDING_LESSONS_CHANNEL, PENDING_LESSONS_EVENT,
};
use domain::schedule as ScheduleApi;
use futures::Stream;
use log::*;
use std::convert::Infallible;

/// POST add a slot to an instructor's schedule
#[utoipa::path(
    post,
    path = "/api/instructors/schedule",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Slot created", body = domain::schedule::SlotView),
        (status = 400, description = "Missing or malformed fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown instructor", body = crate::error::ErrorResponse),
        (status = 409, description = "Overlaps an existing slot", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_slot(
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST create schedule slot: {params:?}");

    let slot = ScheduleApi::create_slot(
        app_state.db_ref(),
        app_state.event_publisher.as_ref(),
        params.into(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), slot)),
    ))
}

/// GET lessons waiting for a decision, paid at the school
#[utoipa::path(
    get,
    path = "/api/instructors/pending-requests",
    responses(
        (status = 200, description = "Pending local-payment lessons", body = [domain::pending_request::PendingLessonRequest]),
    )
)]
pub async fn pending_requests(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let requests = PendingRequestApi::find_pending_lessons(app_state.db_ref()).await?;
    debug!("Found {} pending lesson request(s)", requests.len());

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), requests)))
}

/// GET live stream of the pending lesson requests
#[utoipa::path(
    get,
    path = "/api/instructors/pending-requests/stream",
    responses(
        (status = 200, description = "text/event-stream: handshake, snapshot, then recomputed views"),
    )
)]
pub async fn pending_requests_stream(
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Establishing pending lesson stream");
    let db = app_state.db_ref().clone();

    open_stream(&app_state, PENDING_LESSONS_CHANNEL, async move {
        let requests = PendingRequestApi::find_pending_lessons(&db).await;
        snapshot_from(PENDING_LESSONS_EVENT, requests)
    })
}
