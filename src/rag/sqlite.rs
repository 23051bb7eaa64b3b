//! SQLite-backed vector store.
//!
//! In-process index using SQLite for rows and brute-force cosine similarity
//! for search. Embeddings are stored as little-endian f32 BLOBs; metadata as
//! JSON text against the closed `ChunkMetadata` schema.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkMetadata, ChunkRecord, ScoredChunk, VectorStore};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::store)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kb_chunks (
                chunk_id TEXT PRIMARY KEY,
                namespace TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::store)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_kb_namespace ON kb_chunks(namespace)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::store)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Cosine similarity clamped to [0, 1].
    fn similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            (dot / denom).clamp(0.0, 1.0)
        }
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ChunkRecord, ApiError> {
        let metadata_str: String = row.get("metadata");
        let metadata: ChunkMetadata = serde_json::from_str(&metadata_str)
            .map_err(|e| ApiError::store(format!("corrupt chunk metadata: {e}")))?;

        Ok(ChunkRecord {
            id: row.get("chunk_id"),
            content: row.get("content"),
            metadata,
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(
        &self,
        namespace: &str,
        records: Vec<(ChunkRecord, Vec<f32>)>,
    ) -> Result<(), ApiError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::store)?;

        for (record, embedding) in &records {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str =
                serde_json::to_string(&record.metadata).map_err(ApiError::store)?;

            sqlx::query(
                "INSERT OR REPLACE INTO kb_chunks (chunk_id, namespace, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&record.id)
            .bind(namespace)
            .bind(&record.content)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::store)?;
        }

        tx.commit().await.map_err(ApiError::store)?;
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, metadata, embedding
             FROM kb_chunks
             WHERE namespace = ?1",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::store)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let embedding_bytes: Vec<u8> = row.get("embedding");
            if embedding_bytes.is_empty() {
                continue;
            }
            let stored = Self::deserialize_embedding(&embedding_bytes);
            let score = Self::similarity(embedding, &stored);
            scored.push(ScoredChunk {
                record: Self::row_to_record(row)?,
                score,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn list_all(&self, namespace: &str) -> Result<Vec<ChunkRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, metadata, embedding
             FROM kb_chunks
             WHERE namespace = ?1
             ORDER BY created_at ASC, chunk_id ASC",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::store)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self, namespace: &str) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kb_chunks WHERE namespace = ?1")
            .bind(namespace)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::store)?;

        Ok(count as usize)
    }
}
