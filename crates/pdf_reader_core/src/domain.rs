//! crates/pdf_reader_core/src/domain.rs
//!
//! Defines the pure, core data structures for the reader.
//! These structs are independent of the transport and of the PDF library.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifies a chat user. Serialized as a bare integer (a string when used as a JSON key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The paginated text of one document. Shared between the store and readers.
pub type Pages = Arc<Vec<String>>;

/// A document ingested by a user. Its pages never change after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub pages: Pages,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the page at a zero-based index, if any.
    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }
}

/// Where a user is inside a document. Never stored; it travels inside button tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub filename: String,
    pub index: usize,
}

impl Cursor {
    pub fn new(filename: impl Into<String>, index: usize) -> Self {
        Self {
            filename: filename.into(),
            index,
        }
    }

    pub fn first_page(filename: impl Into<String>) -> Self {
        Self::new(filename, 0)
    }
}

/// The complete persisted state of the library.
///
/// `users_files` keeps each user's filenames in upload order; `files_pages`
/// holds the content, scoped by user so equal filenames never collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub users_files: BTreeMap<UserId, Vec<String>>,
    pub files_pages: BTreeMap<UserId, BTreeMap<String, Pages>>,
}

impl LibrarySnapshot {
    pub fn is_empty(&self) -> bool {
        self.users_files.values().all(Vec::is_empty) && self.files_pages.values().all(BTreeMap::is_empty)
    }

    /// Total number of stored documents across all users.
    pub fn document_count(&self) -> usize {
        self.files_pages.values().map(BTreeMap::len).sum()
    }
}
