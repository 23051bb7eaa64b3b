//! Embedding generation.
//!
//! `Embedder` is the capability interface the pipeline depends on; the
//! production implementation talks to an OpenAI-compatible `/v1/embeddings`
//! endpoint. A failed embedding is always surfaced — the pipeline never
//! substitutes a zero vector.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::config::EmbeddingSettings;
use crate::core::errors::ApiError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each input into a fixed-dimension vector, preserving order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;

    fn dimension(&self) -> usize;
}

pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        let api_key = env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::debug!(
                env = settings.api_key_env,
                "no embedding API key set; sending unauthenticated requests"
            );
        }

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            dimension: settings.dimension,
        })
    }

    #[cfg(test)]
    fn for_test(base_url: &str, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: "test-embedding".to_string(),
            api_key: None,
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Embedding(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Embedding(format!(
                "embedding endpoint returned {status}: {text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Embedding(format!("invalid embedding response: {e}")))?;

        let data = payload["data"]
            .as_array()
            .ok_or_else(|| ApiError::Embedding("embedding response missing data".to_string()))?;

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let values = item["embedding"].as_array().ok_or_else(|| {
                ApiError::Embedding("embedding response item missing vector".to_string())
            })?;
            let vector: Vec<f32> = values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();

            if vector.len() != self.dimension {
                return Err(ApiError::Embedding(format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.dimension,
                    vector.len()
                )));
            }
            embeddings.push(vector);
        }

        if embeddings.len() != inputs.len() {
            return Err(ApiError::Embedding(format!(
                "embedding count mismatch: sent {} inputs, got {} vectors",
                inputs.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
