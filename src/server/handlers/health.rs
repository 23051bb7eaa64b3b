use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let indexed_chunks = state.processor.indexed_chunk_count().await.unwrap_or(0);
    let documents = state
        .processor
        .list_documents()
        .await
        .map(|docs| docs.len())
        .unwrap_or(0);

    Ok(Json(json!({
        "status": "ok",
        "namespace": state.settings.rag.namespace,
        "indexed_chunks": indexed_chunks,
        "documents": documents,
    })))
}
