use axum::{
    async_trait,
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Request,
    },
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Request body accepted either as JSON or as an urlencoded HTML form,
/// chosen by `Content-Type`. Anything that is not a form is read as JSON.
pub struct JsonOrForm<T>(pub T);

#[derive(Debug, thiserror::Error)]
pub enum BodyRejection {
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Form(#[from] FormRejection),
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        match self {
            BodyRejection::Json(r) => r.into_response(),
            BodyRejection::Form(r) => r.into_response(),
        }
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = BodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(body) = Form::<T>::from_request(req, state).await?;
            Ok(Self(body))
        } else {
            let Json(body) = Json::<T>::from_request(req, state).await?;
            Ok(Self(body))
        }
    }
}

/// Unreadable bodies are reported the same way as absent fields.
pub fn body_or_missing<T>(
    payload: Result<JsonOrForm<T>, BodyRejection>,
    message: &'static str,
) -> AppResult<T> {
    payload.map(|JsonOrForm(body)| body).map_err(|rejection| {
        warn!(error = %rejection, "unreadable request body");
        AppError::Validation(message)
    })
}
