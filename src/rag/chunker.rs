//! Overlapping text chunker with sentence-boundary preference.
//!
//! The splitter scans left to right. Each chunk spans up to `chunk_size`
//! characters; when the window does not reach the end of the text, the last
//! sentence-ending period or newline inside it is preferred as the cut point
//! if it falls beyond 70% of the window. A boundary cut advances to just
//! after the break; a hard cut slides back by `overlap` so consecutive
//! chunks share trailing context. Chunking is a pure function of its input
//! and configuration.

use crate::core::config::RagSettings;

#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_size: 100,
        }
    }
}

impl From<&RagSettings> for ChunkerConfig {
    fn from(settings: &RagSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
            min_chunk_size: settings.min_chunk_size,
        }
    }
}

/// Split text into ordered, overlapping chunks.
///
/// Works on characters, not bytes, so multi-byte text can never be split
/// inside a code point. Chunks are trimmed; empty ones are dropped, and a
/// non-final chunk whose trimmed text is shorter than `min_chunk_size` is
/// dropped as whitespace-dominated. The final chunk is always kept when
/// non-empty, so every character of the input is covered by some chunk.
pub fn chunk_text(text: &str, config: ChunkerConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 || config.chunk_size == 0 {
        return Vec::new();
    }

    let overlap = config.overlap.min(config.chunk_size - 1);
    let boundary_floor = (config.chunk_size * 7) / 10;

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + config.chunk_size).min(total);
        let mut boundary_cut = false;

        if end < total {
            if let Some(rel) = chars[start..end]
                .iter()
                .rposition(|c| *c == '.' || *c == '\n')
            {
                if rel > boundary_floor {
                    end = start + rel + 1;
                    boundary_cut = true;
                }
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty()
            && (end == total || trimmed.chars().count() >= config.min_chunk_size)
        {
            chunks.push(trimmed.to_string());
        }

        if end == total {
            break;
        }

        // The boundary branch intentionally skips the overlap subtraction:
        // the next chunk starts right after the break point.
        start = if boundary_cut { end } else { end - overlap };
    }

    chunks
}
