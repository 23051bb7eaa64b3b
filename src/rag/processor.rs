//! Document processor — the ingestion and retrieval entry points.
//!
//! Ingestion: bytes/URL → extractor → chunker → embedder → vector store.
//! Retrieval: query → embedder → similarity search → relevance filter →
//! context assembly. The processor is built once at startup and shared; the
//! embedder and store are capability traits so tests run without a network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::chunker::{chunk_text, ChunkerConfig};
use super::context::{assemble, RetrievedContext};
use super::embedder::Embedder;
use super::store::{ChunkMetadata, ChunkRecord, ScoredChunk, SourceKind, VectorStore};
use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::extract::{self, FileKind};

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub filename: String,
    pub source: SourceKind,
    pub chunk_count: usize,
}

/// One distinct indexed document, derived by grouping stored chunks by
/// filename. The first-seen record wins the display attributes.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub chunk_count: usize,
}

pub struct DocumentProcessor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: Settings,
    web_client: reqwest::Client,
}

impl DocumentProcessor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: Settings,
    ) -> Result<Self, ApiError> {
        let web_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.rag.web_timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            embedder,
            store,
            settings,
            web_client,
        })
    }

    /// Ingest an uploaded file. Atomic from the caller's perspective: either
    /// all chunks are embedded and upserted, or the call fails with the
    /// stage that broke and nothing is reported as stored.
    pub async fn process_document(
        &self,
        filename: &str,
        bytes: &[u8],
        kind: FileKind,
    ) -> Result<IngestReport, ApiError> {
        let (text, source) = match kind {
            FileKind::Pdf => (extract::pdf::extract(bytes, filename)?.text, SourceKind::Pdf),
            FileKind::Markdown => (
                extract::markdown::extract(bytes, filename)?,
                SourceKind::Markdown,
            ),
        };

        self.ingest(filename, &text, source, None).await
    }

    /// Ingest a web page. The URL scheme is validated before any fetch.
    pub async fn process_website(&self, raw_url: &str) -> Result<IngestReport, ApiError> {
        let url = Url::parse(raw_url)
            .map_err(|e| ApiError::Validation(format!("invalid URL {raw_url}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ApiError::Validation(format!(
                "unsupported URL scheme '{}': only http and https are allowed",
                url.scheme()
            )));
        }

        let page = extract::website::fetch(&self.web_client, &url).await?;
        let filename = page
            .title
            .unwrap_or_else(|| url.host_str().unwrap_or("website").to_string());

        self.ingest(&filename, &page.text, SourceKind::Website, Some(url.to_string()))
            .await
    }

    async fn ingest(
        &self,
        filename: &str,
        text: &str,
        source: SourceKind,
        url: Option<String>,
    ) -> Result<IngestReport, ApiError> {
        let chunks = chunk_text(text, ChunkerConfig::from(&self.settings.rag));
        if chunks.is_empty() {
            return Err(ApiError::extraction(filename, "no-content"));
        }
        let total_chunks = chunks.len();
        let timestamp = Utc::now();

        // Batched, sequential embedding keeps returned vectors aligned with
        // chunk order, so chunk ids always reflect the original positions.
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total_chunks);
        for batch in chunks.chunks(self.settings.embedding.batch_size.max(1)) {
            let embedded = self.embedder.embed(batch).await?;
            vectors.extend(embedded);
        }
        if vectors.len() != total_chunks {
            return Err(ApiError::Embedding(format!(
                "expected {total_chunks} vectors for {filename}, got {}",
                vectors.len()
            )));
        }

        let records: Vec<(ChunkRecord, Vec<f32>)> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(chunk_index, (content, vector))| {
                let record = ChunkRecord {
                    id: ChunkRecord::chunk_id(filename, chunk_index),
                    content,
                    metadata: ChunkMetadata {
                        source,
                        filename: filename.to_string(),
                        chunk_index,
                        total_chunks,
                        url: url.clone(),
                        timestamp,
                    },
                };
                (record, vector)
            })
            .collect();

        self.store
            .upsert(&self.settings.rag.namespace, records)
            .await?;

        tracing::info!(filename, %source, chunks = total_chunks, "ingested document");
        Ok(IngestReport {
            filename: filename.to_string(),
            source,
            chunk_count: total_chunks,
        })
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            ApiError::Embedding("embedding endpoint returned no vector for query".to_string())
        })
    }

    /// Raw similarity search: ranked results with scores, no filtering.
    pub async fn search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, ApiError> {
        let embedding = self.embed_query(query).await?;
        self.store
            .query(&self.settings.rag.namespace, &embedding, k)
            .await
    }

    /// Retrieve relevance-filtered context plus source attributions.
    ///
    /// Fails closed on embedding/store errors; an empty knowledge base or an
    /// all-below-threshold result set returns `has_context = false` instead.
    pub async fn relevant_context(
        &self,
        query: &str,
        max_chunks: Option<usize>,
    ) -> Result<RetrievedContext, ApiError> {
        let max_chunks = max_chunks.unwrap_or(self.settings.rag.max_context_chunks);
        let results = self.search_with_score(query, max_chunks).await?;
        Ok(assemble(
            results,
            self.settings.rag.relevance_threshold,
            max_chunks,
        ))
    }

    /// Inventory of distinct indexed documents.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ApiError> {
        let records = self.store.list_all(&self.settings.rag.namespace).await?;

        let mut order: Vec<String> = Vec::new();
        let mut summaries: HashMap<String, DocumentSummary> = HashMap::new();

        for record in records {
            let metadata = record.metadata;
            match summaries.get_mut(&metadata.filename) {
                Some(summary) => summary.chunk_count += 1,
                None => {
                    order.push(metadata.filename.clone());
                    summaries.insert(
                        metadata.filename.clone(),
                        DocumentSummary {
                            filename: metadata.filename,
                            source: metadata.source,
                            url: metadata.url,
                            timestamp: metadata.timestamp,
                            chunk_count: 1,
                        },
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|filename| summaries.remove(&filename))
            .collect())
    }

    pub async fn indexed_chunk_count(&self) -> Result<usize, ApiError> {
        self.store.count(&self.settings.rag.namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic embedder: hashes text into a small fixed vector.
    struct FakeEmbedder;

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    let sum: u32 = text.bytes().map(u32::from).sum();
                    vec![(sum % 97) as f32, (sum % 31) as f32, 1.0]
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    /// Embedder that always fails, for abort-path tests.
    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::Embedding("model offline".to_string()))
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<(String, ChunkRecord, Vec<f32>)>>,
    }

    #[async_trait]
    impl VectorStore for MemoryStore {
        async fn upsert(
            &self,
            namespace: &str,
            records: Vec<(ChunkRecord, Vec<f32>)>,
        ) -> Result<(), ApiError> {
            let mut rows = self.rows.lock().unwrap();
            for (record, vector) in records {
                rows.retain(|(ns, existing, _)| !(ns == namespace && existing.id == record.id));
                rows.push((namespace.to_string(), record, vector));
            }
            Ok(())
        }

        async fn query(
            &self,
            namespace: &str,
            embedding: &[f32],
            top_k: usize,
        ) -> Result<Vec<ScoredChunk>, ApiError> {
            let rows = self.rows.lock().unwrap();
            let mut scored: Vec<ScoredChunk> = rows
                .iter()
                .filter(|(ns, _, _)| ns == namespace)
                .map(|(_, record, vector)| {
                    let dot: f32 = embedding.iter().zip(vector).map(|(a, b)| a * b).sum();
                    let na: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
                    let nb: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
                    let score = if na * nb <= f32::EPSILON {
                        0.0
                    } else {
                        (dot / (na * nb)).clamp(0.0, 1.0)
                    };
                    ScoredChunk {
                        record: record.clone(),
                        score,
                    }
                })
                .collect();
            scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            scored.truncate(top_k);
            Ok(scored)
        }

        async fn list_all(&self, namespace: &str) -> Result<Vec<ChunkRecord>, ApiError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|(ns, _, _)| ns == namespace)
                .map(|(_, record, _)| record.clone())
                .collect())
        }

        async fn count(&self, namespace: &str) -> Result<usize, ApiError> {
            Ok(self.list_all(namespace).await?.len())
        }
    }

    fn processor_with(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> DocumentProcessor {
        let mut settings = Settings::default();
        settings.rag.chunk_size = 200;
        settings.rag.chunk_overlap = 40;
        settings.rag.min_chunk_size = 10;
        DocumentProcessor::new(embedder, store, settings).unwrap()
    }

    #[tokio::test]
    async fn markdown_ingestion_produces_contiguous_chunk_ids() {
        let store = Arc::new(MemoryStore::default());
        let processor = processor_with(Arc::new(FakeEmbedder), store.clone());

        let body = "A sentence about storage engines. ".repeat(30);
        let report = processor
            .process_document("notes.md", body.as_bytes(), FileKind::Markdown)
            .await
            .unwrap();

        assert!(report.chunk_count >= 2);

        let records = store.list_all("knowledge-base").await.unwrap();
        assert_eq!(records.len(), report.chunk_count);

        let mut indices: Vec<usize> = records.iter().map(|r| r.metadata.chunk_index).collect();
        indices.sort_unstable();
        let expected: Vec<usize> = (0..report.chunk_count).collect();
        assert_eq!(indices, expected);

        for record in &records {
            assert_eq!(record.metadata.total_chunks, report.chunk_count);
            assert_eq!(
                record.id,
                format!("notes.md-chunk-{}", record.metadata.chunk_index)
            );
        }
    }

    #[tokio::test]
    async fn embedding_failure_aborts_before_any_upsert() {
        let store = Arc::new(MemoryStore::default());
        let processor = processor_with(Arc::new(BrokenEmbedder), store.clone());

        let err = processor
            .process_document("notes.md", b"Some markdown body text.", FileKind::Markdown)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Embedding(_)));
        assert_eq!(store.count("knowledge-base").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unparseable_pdf_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        let processor = processor_with(Arc::new(FakeEmbedder), store.clone());

        let err = processor
            .process_document("scan.pdf", b"not a pdf", FileKind::Pdf)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Extraction { .. }));
        assert_eq!(store.count("knowledge-base").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn non_http_url_is_rejected_before_any_fetch() {
        let processor = processor_with(Arc::new(FakeEmbedder), Arc::new(MemoryStore::default()));

        let err = processor
            .process_website("ftp://example.com")
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(msg) => assert!(msg.contains("ftp")),
            other => panic!("expected validation error, got {other:?}"),
        }

        assert!(processor.process_website("not a url").await.is_err());
    }

    /// Embedder that answers with zero vectors, as a misbehaving endpoint
    /// might.
    struct SilentEmbedder;

    #[async_trait]
    impl Embedder for SilentEmbedder {
        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(Vec::new())
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn query_search_embeds_the_query_and_ranks_results() {
        let store = Arc::new(MemoryStore::default());
        let processor = processor_with(Arc::new(FakeEmbedder), store.clone());

        let body = "Phrases about build systems. ".repeat(20);
        processor
            .process_document("builds.md", body.as_bytes(), FileKind::Markdown)
            .await
            .unwrap();

        let results = processor
            .search_with_score("Phrases about build systems.", 10)
            .await
            .unwrap();
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn missing_query_vector_is_an_embedding_error() {
        let processor = processor_with(Arc::new(SilentEmbedder), Arc::new(MemoryStore::default()));

        let err = processor.search_with_score("anything", 5).await.unwrap_err();
        assert!(matches!(err, ApiError::Embedding(_)));
    }

    #[tokio::test]
    async fn empty_query_result_is_not_an_error() {
        let processor = processor_with(Arc::new(FakeEmbedder), Arc::new(MemoryStore::default()));

        let retrieved = processor
            .relevant_context("anything at all", None)
            .await
            .unwrap();
        assert!(!retrieved.has_context);
        assert_eq!(retrieved.context, "");
        assert!(retrieved.sources.is_empty());
    }

    #[tokio::test]
    async fn inventory_groups_chunks_by_filename() {
        let store = Arc::new(MemoryStore::default());
        let processor = processor_with(Arc::new(FakeEmbedder), store.clone());

        let body = "Sentences about a topic. ".repeat(30);
        processor
            .process_document("one.md", body.as_bytes(), FileKind::Markdown)
            .await
            .unwrap();
        processor
            .process_document("two.md", body.as_bytes(), FileKind::Markdown)
            .await
            .unwrap();

        let documents = processor.list_documents().await.unwrap();
        assert_eq!(documents.len(), 2);
        let names: Vec<&str> = documents.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["one.md", "two.md"]);
        assert!(documents.iter().all(|d| d.chunk_count >= 2));
    }
}
