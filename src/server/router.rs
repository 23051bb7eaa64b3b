use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{documents, health, query};
use crate::state::AppState;

/// Uploads are whole PDFs held in memory; cap the body well above the
/// axum default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::upload_documents),
        )
        .route("/api/documents/url", post(documents::ingest_url))
        .route("/api/query", post(query::search))
        .route("/api/context", post(query::context))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
