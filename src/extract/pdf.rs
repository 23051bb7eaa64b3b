//! PDF text extraction.
//!
//! `pdf-extract` does the text extraction (better font encoding handling
//! than raw lopdf); `lopdf` provides the page count and encryption probe.

use lopdf::Document as PdfDocument;

use crate::core::errors::ApiError;

#[derive(Debug)]
pub struct PdfText {
    pub text: String,
    pub page_count: usize,
}

/// Extract text across all pages of a PDF byte buffer.
///
/// Encrypted, corrupted and scanned/image-only documents (no OCR) all fail
/// with reason `"unparseable"`.
pub fn extract(bytes: &[u8], filename: &str) -> Result<PdfText, ApiError> {
    let document = PdfDocument::load_mem(bytes)
        .map_err(|e| unparseable(filename, format!("could not load PDF: {e}")))?;

    if document.is_encrypted() {
        return Err(unparseable(filename, "PDF is encrypted"));
    }
    let page_count = document.get_pages().len();

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| unparseable(filename, format!("could not extract text: {e}")))?;

    if text.trim().is_empty() {
        return Err(unparseable(
            filename,
            "no extractable text (scanned or image-only PDF?)",
        ));
    }

    tracing::info!(
        filename,
        pages = page_count,
        chars = text.len(),
        "extracted PDF text"
    );

    Ok(PdfText { text, page_count })
}

fn unparseable(filename: &str, detail: impl std::fmt::Display) -> ApiError {
    tracing::warn!(filename, %detail, "unparseable PDF");
    ApiError::extraction(filename, "unparseable")
}
