use std::sync::Arc;

use anyhow::Context;

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::rag::{DocumentProcessor, HttpEmbedder, SqliteVectorStore};

/// Global application state shared across all routes.
///
/// Holds the resolved paths, the loaded settings and the document
/// processor that owns the embedder and the vector store.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub processor: Arc<DocumentProcessor>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Setting up paths and loading configuration
    /// 2. Opening the vector store database
    /// 3. Wiring the embedding client and document processor
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let config = ConfigService::new(paths.clone());
        let settings = config.load().context("Failed to load configuration")?;

        let embedder = Arc::new(
            HttpEmbedder::from_settings(&settings.embedding)
                .context("Failed to build embedding client")?,
        );

        let store = Arc::new(
            SqliteVectorStore::new(paths.as_ref())
                .await
                .context("Failed to open vector store")?,
        );

        let processor = Arc::new(
            DocumentProcessor::new(embedder, store, settings.clone())
                .context("Failed to build document processor")?,
        );

        Ok(Arc::new(AppState {
            paths,
            settings,
            processor,
        }))
    }
}
