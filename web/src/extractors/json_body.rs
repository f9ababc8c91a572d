use crate::Error;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use domain::error::Error as DomainError;
use log::*;

/// A JSON request body. Malformed or wrongly typed bodies are answered with
/// 400 and the usual `{message}` error body.
pub(crate) struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!("Rejected JSON body: {rejection}");
                Err(DomainError::validation(rejection.body_text()).into())
            }
        }
    }
}
