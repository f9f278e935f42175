//! HTTP error responses.
//!
//! Every failure is rendered as `{"detail": "<message>"}` with a status code
//! derived from the underlying error.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::chunking::ChunkingError;
use crate::decode::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error("could not read upload: {0}")]
    Decode(#[from] DecodeError),

    /// Malformed or oversized multipart body.
    #[error("{detail}")]
    Upload { status: StatusCode, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Chunking(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Chunking(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upload { status, .. } => *status,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self::Upload {
            status: e.status(),
            detail: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "http", "request failed: {self}");
        } else {
            tracing::debug!(target: "http", "request rejected ({status}): {self}");
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
