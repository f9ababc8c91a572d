use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::lesson as LessonApi;
use log::*;

/// PATCH accept a pending lesson, booking it
#[utoipa::path(
    patch,
    path = "/api/instructors/{instructor_id}/lessons/{lesson_id}/accept",
    params(
        ("instructor_id" = String, Path, description = "Instructor id"),
        ("lesson_id" = String, Path, description = "Lesson slot id"),
    ),
    responses(
        (status = 200, description = "Lesson booked", body = domain::schedule::SlotView),
        (status = 400, description = "Lesson is not pending", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown instructor or lesson", body = crate::error::ErrorResponse),
    )
)]
pub async fn accept(
    State(app_state): State<AppState>,
    Path((instructor_id, lesson_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    debug!("PATCH accept lesson {lesson_id} of instructor {instructor_id}");

    let lesson = LessonApi::accept(
        app_state.db_ref(),
        app_state.event_publisher.as_ref(),
        &instructor_id,
        &lesson_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), lesson)))
}

/// PATCH reject a pending lesson, cancelling it
#[utoipa::path(
    patch,
    path = "/api/instructors/{instructor_id}/lessons/{lesson_id}/reject",
    params(
        ("instructor_id" = String, Path, description = "Instructor id"),
        ("lesson_id" = String, Path, description = "Lesson slot id"),
    ),
    responses(
        (status = 200, description = "Lesson cancelled", body = domain::schedule::SlotView),
        (status = 400, description = "Lesson is not pending", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown instructor or lesson", body = crate::error::ErrorResponse),
    )
)]
pub async fn reject(
    State(app_state): State<AppState>,
    Path((instructor_id, lesson_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, Error> {
    debug!("PATCH reject lesson {lesson_id} of instructor {instructor_id}");

    let lesson = LessonApi::reject(
        app_state.db_ref(),
        app_state.event_publisher.as_ref(),
        &instructor_id,
        &lesson_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), lesson)))
}
