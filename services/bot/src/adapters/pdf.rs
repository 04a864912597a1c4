//! services/bot/src/adapters/pdf.rs
//!
//! This module contains the adapter for PDF text extraction.
//! It implements the `TextExtractionService` port from the `core` crate using `pdf-extract`.

use async_trait::async_trait;
use pdf_reader_core::ports::{PortError, PortResult, TextExtractionService};
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF-";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TextExtractionService` port with `pdf-extract`.
#[derive(Clone, Default)]
pub struct PdfExtractAdapter;

impl PdfExtractAdapter {
    pub fn new() -> Self {
        Self
    }
}

//=========================================================================================
// `TextExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextExtractionService for PdfExtractAdapter {
    /// Extracts the text of all pages. Parsing is CPU-bound, so it runs on the blocking pool.
    async fn extract_text(&self, pdf_data: &[u8]) -> PortResult<String> {
        if !looks_like_pdf(pdf_data) {
            return Err(PortError::Extraction("the file is not a PDF".to_string()));
        }

        let data = pdf_data.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            // The parser panics on some malformed files; that surfaces here as a join error.
            .map_err(|e| PortError::Extraction(format!("the PDF parser aborted: {}", e)))?
            .map_err(|e| PortError::Extraction(e.to_string()))?;

        debug!(bytes = pdf_data.len(), chars = text.len(), "Extracted text from PDF.");
        Ok(text)
    }
}

/// PDF files start with `%PDF-`, possibly after a few bytes of junk.
fn looks_like_pdf(data: &[u8]) -> bool {
    data.windows(PDF_MAGIC.len())
        .take(1024)
        .any(|window| window == PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_are_detected() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(looks_like_pdf(b"\xEF\xBB\xBF%PDF-1.4"));
        assert!(!looks_like_pdf(b"This is not a PDF"));
        assert!(!looks_like_pdf(b""));
    }

    #[tokio::test]
    async fn non_pdf_data_fails_extraction() {
        let result = PdfExtractAdapter::new().extract_text(b"This is not a PDF").await;
        assert!(matches!(result, Err(PortError::Extraction(_))));
    }

    #[tokio::test]
    async fn truncated_pdf_fails_extraction() {
        let result = PdfExtractAdapter::new().extract_text(b"%PDF-1.4\n%%EOF").await;
        assert!(matches!(result, Err(PortError::Extraction(_))));
    }
}
