//! Retrieval-augmented generation pipeline.
//!
//! - `chunker`: overlapping text splitting
//! - `embedder`: text → fixed-dimension vectors
//! - `store`: namespaced vector index abstraction (+ SQLite implementation)
//! - `context`: relevance filtering and context assembly
//! - `processor`: the orchestrator tying ingestion and retrieval together

pub mod chunker;
pub mod context;
pub mod embedder;
pub mod processor;
pub mod sqlite;
pub mod store;

pub use context::RetrievedContext;
pub use embedder::{Embedder, HttpEmbedder};
pub use processor::{DocumentProcessor, DocumentSummary, IngestReport};
pub use sqlite::SqliteVectorStore;
pub use store::{ChunkMetadata, ChunkRecord, ScoredChunk, SourceKind, VectorStore};
