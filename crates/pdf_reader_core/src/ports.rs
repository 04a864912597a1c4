//! crates/pdf_reader_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the reader's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the PDF library and of the storage medium.

use crate::domain::LibrarySnapshot;
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external collaborators (files, parsers).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Text extraction failed: {0}")]
    Extraction(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Extracts the concatenated text of every page of a PDF blob.
    async fn extract_text(&self, pdf_data: &[u8]) -> PortResult<String>;
}

#[async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Loads the last saved state. A store that has never been written loads as empty.
    async fn load(&self) -> PortResult<LibrarySnapshot>;

    /// Replaces the saved state with `snapshot`.
    async fn save(&self, snapshot: &LibrarySnapshot) -> PortResult<()>;
}
