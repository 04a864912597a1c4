//! services/bot/src/error.rs
//!
//! Defines the primary error type for the bot service.

use crate::config::ConfigError;
use pdf_reader_core::LibraryError;

/// The primary error type for the `bot` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error raised by the library store (e.g. while loading it at startup).
    #[error("Library Error: {0}")]
    Library(#[from] LibraryError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
