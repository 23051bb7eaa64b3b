use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the ingestion/retrieval pipeline.
///
/// `Validation` is rejected before any pipeline work starts. `Extraction`
/// carries the filename and a short machine-readable reason ("unparseable",
/// "no-content", "fetch-failed") so the caller can correct the input.
/// `Embedding` is transient and retryable; `Store` means the vector database
/// rejected or lost the write and no partial success is claimed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("extraction failed for {filename}: {reason}")]
    Extraction { filename: String, reason: String },
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("vector store error: {0}")]
    Store(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Store(err.to_string())
    }

    pub fn extraction(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::Extraction {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Extraction { filename, reason } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Could not extract text from {}: {}", filename, reason),
            ),
            ApiError::Embedding(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Embedding service failure (retryable): {}", msg),
            ),
            ApiError::Store(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Vector store failure: {}", msg),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
