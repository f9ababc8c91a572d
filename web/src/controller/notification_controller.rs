use crate::extractors::JsonBody;
use crate::params::notification::EmitParams;
use crate::response::notification::{EmitResponse, StatsResponse};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::Error as DomainError;
use log::*;

/// POST broadcast a notification to every open stream
#[utoipa::path(
    post,
    path = "/api/notifications/emit",
    request_body = EmitParams,
    responses(
        (status = 200, description = "Notification broadcast", body = EmitResponse),
        (status = 400, description = "Missing or empty type", body = crate::error::ErrorResponse),
    )
)]
pub async fn emit(
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<EmitParams>,
) -> Result<impl IntoResponse, Error> {
    let Some(event_type) = params.event_type().map(str::to_string) else {
        return Err(DomainError::validation("type is required").into());
    };

    let delivered = app_state.sse_manager.broadcast(&event_type, params.data());
    debug!("Emitted '{event_type}' to {delivered} connection(s)");

    Ok((StatusCode::OK, Json(EmitResponse { success: true })))
}

/// GET connection and admin email counters
#[utoipa::path(
    get,
    path = "/api/notifications/stats",
    responses(
        (status = 200, description = "Current relay counters", body = StatsResponse),
    )
)]
pub async fn stats(State(app_state): State<AppState>) -> impl IntoResponse {
    let emails = app_state
        .email_metrics
        .as_ref()
        .map(|metrics| metrics.snapshot())
        .unwrap_or_default();

    Json(StatsResponse {
        connections: app_state.sse_manager.connection_count(),
        admin_emails_enabled: app_state.email_metrics.is_some(),
        emails,
    })
}
