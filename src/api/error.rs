use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::pipeline::{AnswerError, IngestError};

/// Error returned by route handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// The message is generic; the cause has already been logged.
    Internal(&'static str),
}

impl ApiError {
    /// Log `err` and hide it behind a generic message.
    pub fn internal(message: &'static str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{message}");
        Self::Internal(message)
    }

    pub fn from_ingest(err: IngestError) -> Self {
        match err {
            IngestError::Validation(msg) => Self::BadRequest(msg),
            other => Self::internal("Failed to store transcript", other),
        }
    }

    pub fn from_answer(err: AnswerError) -> Self {
        match err {
            AnswerError::Validation(msg) => Self::BadRequest(msg),
            other => Self::internal("Failed to answer query", other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string()),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
