use crate::controller::ApiResponse;
use crate::extractors::{JsonBody, QueryParams};
use crate::params::certificate::{CreateParams, IndexParams};
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::certificate as CertificateApi;
use log::*;

/// POST issue a certificate
#[utoipa::path(
    post,
    path = "/api/certificates",
    request_body = CreateParams,
    responses(
        (status = 201, description = "Certificate issued", body = domain::certificate::CertificateView),
        (status = 400, description = "Malformed ids or number", body = crate::error::ErrorResponse),
        (status = 409, description = "Student already holds a certificate for this class", body = crate::error::ErrorResponse),
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    JsonBody(params): JsonBody<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST issue certificate: {params:?}");

    let certificate = CertificateApi::issue(
        app_state.db_ref(),
        app_state.event_publisher.as_ref(),
        params.into(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), certificate)),
    ))
}

/// GET a student's certificates
#[utoipa::path(
    get,
    path = "/api/certificates",
    params(IndexParams),
    responses(
        (status = 200, description = "Certificates ordered by number", body = [domain::certificate::CertificateView]),
        (status = 400, description = "Missing or malformed student_id", body = crate::error::ErrorResponse),
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    QueryParams(params): QueryParams<IndexParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET certificates of student {}", params.student_id);

    let certificates =
        CertificateApi::find_by_student(app_state.db_ref(), &params.student_id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), certificates)))
}
