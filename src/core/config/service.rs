use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::core::errors::ApiError;

/// Typed application settings.
///
/// The whole tree is a closed struct rather than a free-form map so that the
/// ingestion and retrieval paths can never drift apart on field names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rag: RagSettings::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Trailing characters repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Non-final chunks shorter than this after trimming are discarded.
    pub min_chunk_size: usize,
    /// Minimum similarity score for a result to enter assembled context.
    /// Observed deployments use 0.4 or 0.7; this is configuration, not code.
    pub relevance_threshold: f32,
    /// Default number of chunks retrieved per query.
    pub max_context_chunks: usize,
    /// Logical partition in the vector store.
    pub namespace: String,
    /// Timeout for website fetches in seconds.
    pub web_timeout_secs: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 100,
            relevance_threshold: 0.4,
            max_context_chunks: 5,
            namespace: "knowledge-base".to_string(),
            web_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of an OpenAI-compatible embeddings endpoint.
    pub base_url: String,
    pub model: String,
    /// Expected vector dimensionality; responses of any other width are
    /// rejected rather than stored.
    pub dimension: usize,
    /// Chunks embedded per request during ingestion.
    pub batch_size: usize,
    /// Env var holding the bearer token, if the endpoint needs one.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            batch_size: 32,
            api_key_env: "DOCBASE_EMBEDDING_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("DOCBASE_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Load settings from the config file, falling back to defaults when the
    /// file does not exist. A present-but-invalid file is an error.
    pub fn load(&self) -> Result<Settings, ApiError> {
        let path = self.config_path();
        let settings = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(ApiError::internal)?;
            serde_yaml::from_str::<Settings>(&raw).map_err(|e| {
                ApiError::Validation(format!("invalid config {}: {}", path.display(), e))
            })?
        } else {
            Settings::default()
        };

        validate_settings(&settings)?;
        Ok(settings)
    }
}

fn validate_settings(settings: &Settings) -> Result<(), ApiError> {
    let rag = &settings.rag;
    if rag.chunk_size == 0 {
        return Err(ApiError::Validation(
            "rag.chunk_size must be positive".to_string(),
        ));
    }
    if rag.chunk_overlap >= rag.chunk_size {
        return Err(ApiError::Validation(format!(
            "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
            rag.chunk_overlap, rag.chunk_size
        )));
    }
    if !(0.0..=1.0).contains(&rag.relevance_threshold) {
        return Err(ApiError::Validation(format!(
            "rag.relevance_threshold ({}) must be within [0, 1]",
            rag.relevance_threshold
        )));
    }
    if rag.max_context_chunks == 0 {
        return Err(ApiError::Validation(
            "rag.max_context_chunks must be positive".to_string(),
        ));
    }
    if rag.namespace.trim().is_empty() {
        return Err(ApiError::Validation(
            "rag.namespace must not be empty".to_string(),
        ));
    }
    if settings.embedding.dimension == 0 || settings.embedding.batch_size == 0 {
        return Err(ApiError::Validation(
            "embedding.dimension and embedding.batch_size must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.rag.chunk_size, 1000);
        assert_eq!(settings.rag.chunk_overlap, 200);
        assert_eq!(settings.rag.namespace, "knowledge-base");
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let mut settings = Settings::default();
        settings.rag.chunk_overlap = settings.rag.chunk_size;
        assert!(matches!(
            validate_settings(&settings),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        let mut settings = Settings::default();
        settings.rag.relevance_threshold = 1.5;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn partial_yaml_merges_with_defaults() {
        let settings: Settings =
            serde_yaml::from_str("rag:\n  relevance_threshold: 0.7\n").unwrap();
        assert!((settings.rag.relevance_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.rag.chunk_size, 1000);
    }
}
