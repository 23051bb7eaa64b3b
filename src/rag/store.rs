//! VectorStore trait — abstract interface for the similarity index.
//!
//! The pipeline talks to the index exclusively through this trait so that
//! chunking and filtering logic can be tested against in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Markdown,
    Website,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Markdown => write!(f, "markdown"),
            SourceKind::Website => write!(f, "website"),
        }
    }
}

/// Closed metadata schema persisted with every chunk. Ingestion and
/// retrieval share this struct, so the two paths cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: SourceKind,
    /// Display identifier; for websites the page title or hostname fallback.
    pub filename: String,
    /// 0-based position within the parent document.
    pub chunk_index: usize,
    /// Count of chunks produced from the same document.
    pub total_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A persisted chunk: deterministic id, content, and metadata. The embedding
/// vector travels alongside at upsert time and stays inside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// `{filename}-chunk-{chunk_index}` — the vector record identity.
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl ChunkRecord {
    pub fn chunk_id(filename: &str, chunk_index: usize) -> String {
        format!("{filename}-chunk-{chunk_index}")
    }
}

/// Result of a similarity query. Score is cosine similarity clamped to
/// [0, 1]; higher is more similar. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub record: ChunkRecord,
    pub score: f32,
}

/// Namespaced similarity index.
///
/// All operations are scoped to one logical namespace so queries never cross
/// into unrelated data. Upsert is idempotent on record id (last writer wins);
/// the store itself arbitrates concurrent writes to the same id.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite records with their embeddings, as one batch.
    async fn upsert(
        &self,
        namespace: &str,
        records: Vec<(ChunkRecord, Vec<f32>)>,
    ) -> Result<(), ApiError>;

    /// Top-K similarity query, ordered by descending score. Tie order is the
    /// store's native ordering; callers must not depend on it.
    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, ApiError>;

    /// All records in the namespace, for document-inventory listing.
    async fn list_all(&self, namespace: &str) -> Result<Vec<ChunkRecord>, ApiError>;

    /// Total record count in the namespace.
    async fn count(&self, namespace: &str) -> Result<usize, ApiError>;
}
