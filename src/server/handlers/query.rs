//! Query handlers: raw ranked search and assembled context retrieval.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub query: String,
    pub max_chunks: Option<usize>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = require_query(&payload.query)?;
    let k = payload
        .max_results
        .unwrap_or(state.settings.rag.max_context_chunks);

    let results = state.processor.search_with_score(query, k).await?;
    let payload: Vec<Value> = results
        .into_iter()
        .map(|result| {
            json!({
                "content": result.record.content,
                "score": result.score,
                "metadata": {
                    "chunk_id": result.record.id,
                    "filename": result.record.metadata.filename,
                    "chunk_index": result.record.metadata.chunk_index,
                    "total_chunks": result.record.metadata.total_chunks,
                    "source": result.record.metadata.source,
                    "url": result.record.metadata.url,
                    "timestamp": result.record.metadata.timestamp,
                },
            })
        })
        .collect();

    Ok(Json(json!({ "results": payload })))
}

pub async fn context(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = require_query(&payload.query)?;
    let retrieved = state
        .processor
        .relevant_context(query, payload.max_chunks)
        .await?;
    Ok(Json(retrieved))
}

fn require_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("query must not be empty".to_string()));
    }
    Ok(trimmed)
}
