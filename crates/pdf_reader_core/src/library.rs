//! crates/pdf_reader_core/src/library.rs
//!
//! The Library Store: per-user document collections with uniqueness, lookup and
//! deletion. Every mutation is written through the `LibraryRepository` port.

use crate::domain::{Document, LibrarySnapshot, Pages, UserId};
use crate::ports::{LibraryRepository, PortError};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("\"{filename}\" is already in the library of user {user}")]
    DuplicateFilename { user: UserId, filename: String },
    #[error("\"{filename}\" is not in the library of user {user}")]
    NotFound { user: UserId, filename: String },
    /// The in-memory state is correct but could not be saved (or loaded).
    #[error("library persistence failed: {0}")]
    Persistence(#[from] PortError),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Owns the library state and the repository it is persisted to.
pub struct LibraryStore {
    state: Mutex<LibrarySnapshot>,
    repository: Arc<dyn LibraryRepository>,
}

impl LibraryStore {
    /// Loads the saved state from `repository` and repairs inconsistencies between the two maps.
    pub async fn open(repository: Arc<dyn LibraryRepository>) -> LibraryResult<Self> {
        let snapshot = reconcile(repository.load().await?);
        debug!(
            users = snapshot.users_files.len(),
            documents = snapshot.document_count(),
            "Library loaded."
        );
        Ok(Self {
            state: Mutex::new(snapshot),
            repository,
        })
    }

    pub async fn add_document(&self, user: UserId, filename: &str, pages: Vec<String>) -> LibraryResult<Document> {
        let mut state = self.state.lock().await;

        let files = state.users_files.entry(user).or_default();
        if files.iter().any(|f| f == filename) {
            return Err(LibraryError::DuplicateFilename {
                user,
                filename: filename.to_string(),
            });
        }
        files.push(filename.to_string());

        let pages: Pages = if pages.is_empty() {
            Arc::new(vec![String::new()])
        } else {
            Arc::new(pages)
        };
        state
            .files_pages
            .entry(user)
            .or_default()
            .insert(filename.to_string(), pages.clone());

        self.repository.save(&state).await?;
        Ok(Document {
            filename: filename.to_string(),
            pages,
        })
    }

    pub async fn contains(&self, user: UserId, filename: &str) -> bool {
        let state = self.state.lock().await;
        state
            .users_files
            .get(&user)
            .is_some_and(|files| files.iter().any(|f| f == filename))
    }

    /// The user's filenames in upload order.
    pub async fn list_documents(&self, user: UserId) -> Vec<String> {
        let state = self.state.lock().await;
        state.users_files.get(&user).cloned().unwrap_or_default()
    }

    pub async fn has_library(&self, user: UserId) -> bool {
        let state = self.state.lock().await;
        state.users_files.get(&user).is_some_and(|files| !files.is_empty())
    }

    pub async fn get_pages(&self, user: UserId, filename: &str) -> LibraryResult<Document> {
        let state = self.state.lock().await;
        state
            .files_pages
            .get(&user)
            .and_then(|docs| docs.get(filename))
            .map(|pages| Document {
                filename: filename.to_string(),
                pages: pages.clone(),
            })
            .ok_or_else(|| LibraryError::NotFound {
                user,
                filename: filename.to_string(),
            })
    }

    pub async fn delete_document(&self, user: UserId, filename: &str) -> LibraryResult<()> {
        let mut state = self.state.lock().await;

        let position = state
            .users_files
            .get(&user)
            .and_then(|files| files.iter().position(|f| f == filename))
            .ok_or_else(|| LibraryError::NotFound {
                user,
                filename: filename.to_string(),
            })?;

        if let Some(files) = state.users_files.get_mut(&user) {
            files.remove(position);
        }
        if let Some(docs) = state.files_pages.get_mut(&user) {
            docs.remove(filename);
            if docs.is_empty() {
                state.files_pages.remove(&user);
            }
        }

        self.repository.save(&state).await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> LibrarySnapshot {
        self.state.lock().await.clone()
    }
}

/// Makes the listing and the content agree.
///
/// Documents without pages are dropped first. Then duplicate listings collapse to the first
/// occurrence, listings without content are dropped and content nobody lists is appended to
/// its owner's listing.
fn reconcile(mut snapshot: LibrarySnapshot) -> LibrarySnapshot {
    for (user, docs) in snapshot.files_pages.iter_mut() {
        docs.retain(|name, pages| {
            if pages.is_empty() {
                warn!(%user, filename = %name, "Dropping document without pages.");
            }
            !pages.is_empty()
        });
    }
    snapshot.files_pages.retain(|_, docs| !docs.is_empty());

    for (user, files) in snapshot.users_files.iter_mut() {
        let docs = snapshot.files_pages.get(user);
        let mut seen = HashSet::new();
        files.retain(|name| {
            if !seen.insert(name.clone()) {
                warn!(%user, filename = %name, "Dropping duplicate library entry.");
                return false;
            }
            let has_content = docs.is_some_and(|d| d.contains_key(name));
            if !has_content {
                warn!(%user, filename = %name, "Dropping library entry without content.");
            }
            has_content
        });
    }

    for (user, docs) in snapshot.files_pages.iter() {
        let files = snapshot.users_files.entry(*user).or_default();
        for name in docs.keys() {
            if !files.contains(name) {
                warn!(%user, filename = %name, "Relisting document missing from the library.");
                files.push(name.clone());
            }
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct FailingRepository;

    #[async_trait]
    impl LibraryRepository for FailingRepository {
        async fn load(&self) -> PortResult<LibrarySnapshot> {
            Ok(LibrarySnapshot::default())
        }

        async fn save(&self, _snapshot: &LibrarySnapshot) -> PortResult<()> {
            Err(PortError::Unexpected("disk full".to_string()))
        }
    }

    fn pages(texts: &[&str]) -> Pages {
        Arc::new(texts.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn reconcile_repairs_both_maps() {
        let user = UserId(7);
        let mut snapshot = LibrarySnapshot::default();
        snapshot.users_files.insert(
            user,
            vec!["a.pdf".into(), "ghost.pdf".into(), "a.pdf".into(), "blank.pdf".into()],
        );
        snapshot.files_pages.insert(
            user,
            BTreeMap::from([
                ("a.pdf".to_string(), pages(&["one"])),
                ("orphan.pdf".to_string(), pages(&["two"])),
                ("blank.pdf".to_string(), pages(&[])),
            ]),
        );

        let repaired = reconcile(snapshot);
        assert_eq!(repaired.users_files[&user], vec!["a.pdf", "orphan.pdf"]);
        assert_eq!(repaired.files_pages[&user].len(), 2);
    }

    #[tokio::test]
    async fn failed_save_keeps_the_mutation_in_memory() {
        let store = LibraryStore::open(Arc::new(FailingRepository)).await.unwrap();
        let user = UserId(1);

        let result = store.add_document(user, "book.pdf", vec!["page".into()]).await;
        assert!(matches!(result, Err(LibraryError::Persistence(_))));
        assert_eq!(store.list_documents(user).await, vec!["book.pdf"]);
        assert!(store.get_pages(user, "book.pdf").await.is_ok());
    }

    #[tokio::test]
    async fn empty_page_list_is_stored_as_one_empty_page() {
        let store = LibraryStore::open(Arc::new(FailingRepository)).await.unwrap();
        let _ = store.add_document(UserId(1), "blank.pdf", Vec::new()).await;
        let doc = store.get_pages(UserId(1), "blank.pdf").await.unwrap();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.page(0), Some(""));
    }
}
