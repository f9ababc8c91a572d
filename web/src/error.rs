use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                    EntityErrorKind::Invalid => {
                        (StatusCode::BAD_REQUEST, "Invalid request".to_string())
                    }
                    EntityErrorKind::Duplicate => {
                        (StatusCode::CONFLICT, "Record already exists".to_string())
                    }
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    ),
                },
                InternalErrorKind::Validation(message) => {
                    (StatusCode::BAD_REQUEST, message.clone())
                }
                InternalErrorKind::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
                InternalErrorKind::Config | InternalErrorKind::Other(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => (StatusCode::BAD_GATEWAY, "Bad gateway".to_string()),
                ExternalErrorKind::Other(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!("Request failed with {status}: {:?}", self.0);
        } else {
            debug!("Request rejected with {status}: {message}");
        }

        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        Error(err).into_response().status()
    }

    fn internal(kind: InternalErrorKind) -> DomainError {
        DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(kind),
        }
    }

    #[test]
    fn test_business_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(DomainError::validation("start must be before end")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::conflict("overlapping slot")),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(DomainError::not_found()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(internal(InternalErrorKind::Entity(EntityErrorKind::Duplicate))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_infrastructure_errors_map_to_server_statuses() {
        assert_eq!(
            status_of(internal(InternalErrorKind::Entity(
                EntityErrorKind::DbTransaction
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(internal(InternalErrorKind::Config)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DomainError {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let (_, message) = Error(DomainError::validation("date must be YYYY-MM-DD"))
            .status_and_message();
        assert_eq!(message, "date must be YYYY-MM-DD");

        let (_, message) = Error(internal(InternalErrorKind::Other(
            "connection string leaked".to_string(),
        )))
        .status_and_message();
        assert_eq!(message, "Internal server error");
    }
}
