//! services/bot/src/adapters/json_store.rs
//!
//! This module contains the persistence adapter, which is the concrete implementation
//! of the `LibraryRepository` port from the `core` crate. The library lives in two
//! pretty-printed JSON files inside the data directory.

use async_trait::async_trait;
use pdf_reader_core::domain::{LibrarySnapshot, Pages, UserId};
use pdf_reader_core::ports::{LibraryRepository, PortError, PortResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// User id -> ordered filenames.
pub const USERS_FILES: &str = "users_files.json";
/// User id -> filename -> pages.
pub const FILES_PAGES: &str = "files_pages.json";

type UsersFiles = BTreeMap<UserId, Vec<String>>;
type FilesPages = BTreeMap<UserId, BTreeMap<String, Pages>>;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed repository that implements the `LibraryRepository` port.
#[derive(Clone, Debug)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    /// Creates a new `JsonFileRepository`. The directory is created on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

//=========================================================================================
// `LibraryRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl LibraryRepository for JsonFileRepository {
    async fn load(&self) -> PortResult<LibrarySnapshot> {
        let users_path = self.dir.join(USERS_FILES);
        let users_files: UsersFiles = match read_if_present(&users_path).await? {
            Some(raw) => match serde_json::from_slice(&raw) {
                Ok(users_files) => users_files,
                Err(e) => {
                    set_aside(&users_path, &e).await?;
                    UsersFiles::default()
                }
            },
            None => UsersFiles::default(),
        };

        let pages_path = self.dir.join(FILES_PAGES);
        let files_pages = match read_if_present(&pages_path).await? {
            Some(raw) => match parse_files_pages(&raw, &users_files) {
                Ok(files_pages) => files_pages,
                Err(e) => {
                    set_aside(&pages_path, &e).await?;
                    FilesPages::default()
                }
            },
            None => FilesPages::default(),
        };

        Ok(LibrarySnapshot {
            users_files,
            files_pages,
        })
    }

    async fn save(&self, snapshot: &LibrarySnapshot) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PortError::Unexpected(format!("cannot create {}: {}", self.dir.display(), e)))?;
        write_json_atomically(&self.dir.join(USERS_FILES), &snapshot.users_files).await?;
        write_json_atomically(&self.dir.join(FILES_PAGES), &snapshot.files_pages).await?;
        debug!(dir = %self.dir.display(), "Library saved.");
        Ok(())
    }
}

/// Reads a saved file, or `None` when nothing has been saved yet.
async fn read_if_present(path: &Path) -> PortResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No saved data, starting empty.");
            Ok(None)
        }
        Err(e) => Err(PortError::Unexpected(format!("cannot read {}: {}", path.display(), e))),
    }
}

/// Parses the per-user page layout, falling back to the older flat `filename -> pages` layout.
fn parse_files_pages(raw: &[u8], users_files: &UsersFiles) -> serde_json::Result<FilesPages> {
    match serde_json::from_slice::<FilesPages>(raw) {
        Ok(files_pages) => Ok(files_pages),
        Err(e) => {
            let flat: BTreeMap<String, Pages> = serde_json::from_slice(raw).map_err(|_| e)?;
            Ok(migrate_flat_pages(flat, users_files))
        }
    }
}

/// Gives each document of a flat layout to every user whose listing names it.
fn migrate_flat_pages(flat: BTreeMap<String, Pages>, users_files: &UsersFiles) -> FilesPages {
    let mut files_pages = FilesPages::default();
    for (filename, pages) in flat {
        let owners: Vec<UserId> = users_files
            .iter()
            .filter(|(_, files)| files.contains(&filename))
            .map(|(user, _)| *user)
            .collect();
        if owners.is_empty() {
            warn!(filename = %filename, "Dropping a flat-layout document nobody lists.");
            continue;
        }
        for user in owners {
            files_pages
                .entry(user)
                .or_default()
                .insert(filename.clone(), pages.clone());
        }
    }
    info!(documents = files_pages.values().map(BTreeMap::len).sum::<usize>(), "Migrated flat page layout.");
    files_pages
}

/// Renames an unreadable file out of the way so the next save cannot overwrite it.
async fn set_aside(path: &Path, error: &serde_json::Error) -> PortResult<()> {
    let backup = path.with_extension(format!("corrupt-{}.json", Uuid::new_v4()));
    tokio::fs::rename(path, &backup)
        .await
        .map_err(|e| PortError::Unexpected(format!("cannot move aside {}: {}", path.display(), e)))?;
    warn!(
        path = %path.display(),
        backup = %backup.display(),
        error = %error,
        "Saved data is malformed, starting empty."
    );
    Ok(())
}

/// Writes `value` next to `path` and renames it into place, so readers never see a partial file.
async fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> PortResult<()> {
    let json = to_json_pretty(value)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PortError::Unexpected(format!("invalid file path {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&tmp, json).await {
        return Err(PortError::Unexpected(format!("cannot write {}: {}", tmp.display(), e)));
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(PortError::Unexpected(format!("cannot replace {}: {}", path.display(), e)));
    }
    Ok(())
}

/// Pretty JSON with four-space indentation.
fn to_json_pretty<T: Serialize>(value: &T) -> PortResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| PortError::Unexpected(format!("cannot serialize library: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_reader_core::domain::UserId;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn sample() -> LibrarySnapshot {
        let mut snapshot = LibrarySnapshot::default();
        snapshot
            .users_files
            .insert(UserId(42), vec!["b.pdf".into(), "a.pdf".into()]);
        snapshot.files_pages.insert(
            UserId(42),
            BTreeMap::from([
                ("a.pdf".to_string(), Arc::new(vec!["one two".to_string()])),
                ("b.pdf".to_string(), Arc::new(vec!["three".to_string(), "four".to_string()])),
            ]),
        );
        snapshot
    }

    #[tokio::test]
    async fn missing_directory_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("absent"));
        assert!(repo.load().await.unwrap().is_empty());
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn malformed_files_load_empty_and_are_kept_aside() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USERS_FILES), "{ not json").unwrap();
        std::fs::write(dir.path().join(FILES_PAGES), "[]").unwrap();
        let repo = JsonFileRepository::new(dir.path());

        assert!(repo.load().await.unwrap().is_empty());
        repo.save(&sample()).await.unwrap();

        let names = file_names(dir.path());
        assert_eq!(names.len(), 4);
        let backups: Vec<&String> = names.iter().filter(|n| n.contains(".corrupt-")).collect();
        assert_eq!(backups.len(), 2);
        let kept: Vec<String> = backups
            .iter()
            .map(|n| std::fs::read_to_string(dir.path().join(n)).unwrap())
            .collect();
        assert!(kept.contains(&"{ not json".to_string()));
        assert!(kept.contains(&"[]".to_string()));
    }

    #[tokio::test]
    async fn flat_page_layout_is_migrated_to_its_owners() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(USERS_FILES),
            r#"{ "42": ["a.pdf", "b.pdf"], "7": ["a.pdf"] }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(FILES_PAGES),
            r#"{ "a.pdf": ["one two"], "b.pdf": ["three", "four"], "stray.pdf": ["x"] }"#,
        )
        .unwrap();
        let repo = JsonFileRepository::new(dir.path());

        let snapshot = repo.load().await.unwrap();

        assert_eq!(snapshot.files_pages[&UserId(42)].len(), 2);
        assert_eq!(snapshot.files_pages[&UserId(42)]["b.pdf"].len(), 2);
        assert_eq!(
            snapshot.files_pages[&UserId(7)].keys().collect::<Vec<_>>(),
            vec!["a.pdf"]
        );
        assert_eq!(snapshot.document_count(), 3);
        assert_eq!(file_names(dir.path()), vec![FILES_PAGES.to_string(), USERS_FILES.to_string()]);
    }

    #[tokio::test]
    async fn saved_state_reloads_equal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("data"));

        repo.save(&sample()).await.unwrap();
        let reloaded = JsonFileRepository::new(dir.path().join("data")).load().await.unwrap();

        assert_eq!(reloaded, sample());
    }

    #[tokio::test]
    async fn files_use_the_documented_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        repo.save(&sample()).await.unwrap();

        let users: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(USERS_FILES)).unwrap()).unwrap();
        assert_eq!(users, serde_json::json!({ "42": ["b.pdf", "a.pdf"] }));

        let raw = std::fs::read_to_string(dir.path().join(FILES_PAGES)).unwrap();
        assert!(raw.contains("\n    \"42\": {"));
        let pages: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(pages["42"]["b.pdf"], serde_json::json!(["three", "four"]));
    }

    #[tokio::test]
    async fn save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        repo.save(&sample()).await.unwrap();
        repo.save(&LibrarySnapshot::default()).await.unwrap();

        assert_eq!(file_names(dir.path()), vec![FILES_PAGES.to_string(), USERS_FILES.to_string()]);
        assert!(repo.load().await.unwrap().is_empty());
    }
}
