//! Relevance filtering and context assembly.
//!
//! Search results are filtered by a strict score threshold, ranked, and
//! concatenated into one bounded context string with a parallel list of
//! source attributions for citation display.

use serde::Serialize;

use super::store::ScoredChunk;

/// Fixed preview length for source attributions, in characters.
pub const PREVIEW_LENGTH: usize = 160;

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Per-chunk citation metadata returned alongside the context. Used for
/// user-facing display, not for answer generation.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAttribution {
    pub filename: String,
    pub chunk_index: usize,
    pub score: f32,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievedContext {
    pub context: String,
    pub sources: Vec<SourceAttribution>,
    /// Distinguishes "nothing relevant" (a valid outcome) from the context
    /// itself being empty; pipeline failures surface as errors instead.
    pub has_context: bool,
}

impl RetrievedContext {
    pub fn empty() -> Self {
        Self {
            context: String::new(),
            sources: Vec::new(),
            has_context: false,
        }
    }
}

/// Assemble context from search results.
///
/// Results scoring exactly at the threshold are excluded (strict
/// inequality). Chunks from the same document are not deduplicated — each
/// chunk is independently relevant.
pub fn assemble(results: Vec<ScoredChunk>, threshold: f32, max_chunks: usize) -> RetrievedContext {
    let mut relevant: Vec<ScoredChunk> = results
        .into_iter()
        .filter(|result| result.score > threshold)
        .collect();

    relevant.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    relevant.truncate(max_chunks);

    // The zero-survivor check comes after the bound so max_chunks = 0 is an
    // empty outcome, never has_context = true with nothing in it.
    if relevant.is_empty() {
        return RetrievedContext::empty();
    }

    let context = relevant
        .iter()
        .map(|result| format!("[relevance: {:.2}]\n{}", result.score, result.record.content))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let sources = relevant
        .iter()
        .map(|result| SourceAttribution {
            filename: result.record.metadata.filename.clone(),
            chunk_index: result.record.metadata.chunk_index,
            score: result.score,
            preview: preview_of(&result.record.content),
        })
        .collect();

    RetrievedContext {
        context,
        sources,
        has_context: true,
    }
}

fn preview_of(content: &str) -> String {
    let mut preview: String = content.chars().take(PREVIEW_LENGTH).collect();
    if content.chars().count() > PREVIEW_LENGTH {
        preview.push('…');
    }
    preview
}
