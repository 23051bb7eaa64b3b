//! Document intake handlers: file uploads, URL submission, inventory.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::extract::FileKind;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestUrlRequest {
    pub url: String,
}

/// Multipart upload of one or more files.
///
/// Each file's outcome is independent: one unparseable document never aborts
/// its siblings, and the per-file result carries enough detail to retry.
pub async fn upload_documents(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut results: Vec<Value> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("could not read upload {filename}: {e}")))?;

        let outcome = match FileKind::from_filename(&filename) {
            Ok(kind) => {
                state
                    .processor
                    .process_document(&filename, &bytes, kind)
                    .await
            }
            Err(err) => Err(err),
        };

        results.push(match outcome {
            Ok(report) => json!({
                "filename": report.filename,
                "source": report.source,
                "chunks": report.chunk_count,
                "ok": true,
            }),
            Err(err) => {
                tracing::warn!(filename, error = %err, "document ingestion failed");
                json!({
                    "filename": filename,
                    "ok": false,
                    "error": err.to_string(),
                })
            }
        });
    }

    if results.is_empty() {
        return Err(ApiError::Validation(
            "no files found in upload".to_string(),
        ));
    }

    Ok(Json(json!({ "results": results })))
}

pub async fn ingest_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestUrlRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.processor.process_website(&payload.url).await?;
    Ok(Json(json!({
        "filename": report.filename,
        "source": report.source,
        "chunks": report.chunk_count,
        "ok": true,
    })))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.processor.list_documents().await?;
    Ok(Json(json!({ "documents": documents })))
}
