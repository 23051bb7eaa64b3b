//! Format-specific text extraction.
//!
//! Each extractor turns raw input into normalized plain text and fails with
//! an extraction error carrying the filename and a short reason. Scanned or
//! encrypted PDFs and JavaScript-rendered pages are unsupported.

pub mod markdown;
pub mod pdf;
pub mod website;

use crate::core::errors::ApiError;

/// Declared type of an uploaded file, decided from its extension before any
/// pipeline work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Markdown,
}

impl FileKind {
    pub fn from_filename(filename: &str) -> Result<Self, ApiError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "md" | "markdown" => Ok(FileKind::Markdown),
            _ => Err(ApiError::Validation(format!(
                "unsupported file extension for {filename}: expected .pdf, .md or .markdown"
            ))),
        }
    }
}
