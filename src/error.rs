use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::chat::client::UpstreamError;

/// Every failure a handler can report, mapped onto an HTTP status and a short
/// `{ "error": "..." }` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Email already in use")]
    Conflict,
    #[error("{0}")]
    Auth(&'static str),
    #[error("Server not configured: missing {0}")]
    Config(&'static str),
    #[error("AI service error")]
    Upstream(#[source] UpstreamError),
    #[error("No response from AI")]
    UpstreamEmpty,
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn internal(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Config(_) | AppError::Upstream(_) | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::UpstreamEmpty => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal { message, source } => {
                error!(error = %format!("{source:#}"), "{message}");
            }
            AppError::Upstream(source) => error!(error = %source, "upstream provider failed"),
            other if status.is_server_error() => error!(error = %other, "request failed"),
            other => warn!(%status, error = %other, "request rejected"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
