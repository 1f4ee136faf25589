//! Document persistence.
//!
//! # Responsibilities
//! - Existence checks that never create files
//! - Load-or-create for mutating actions
//! - Whole-document rewrites through a temp file and rename
//! - Sweeping temp files left by rewrites that were cancelled mid-way
//!
//! Callers hold the file's lock from [`FileLocks`] around every call.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::codec::CodecError;
use crate::observability::metrics;
use crate::routing::Route;
use crate::store::document::Document;
use crate::store::locks::{FileGuard, FileLocks};

/// Errors reading or writing a backing document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Document {} is invalid: {source}", .path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl StoreError {
    fn io(op: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| StoreError::Io { op, path, source }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    locks: FileLocks,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock guarding a route's document.
    pub async fn lock(&self, route: &Route, exclusive: bool) -> FileGuard {
        if exclusive {
            self.locks.exclusive(&route.file).await
        } else {
            self.locks.shared(&route.file).await
        }
    }

    pub fn locks(&self) -> &FileLocks {
        &self.locks
    }

    pub async fn exists(&self, route: &Route) -> Result<bool, StoreError> {
        fs::try_exists(&route.file)
            .await
            .map_err(StoreError::io("stat", &route.file))
    }

    /// Read and decode an existing document.
    pub async fn load(&self, route: &Route) -> Result<Document, StoreError> {
        let bytes = fs::read(&route.file)
            .await
            .map_err(StoreError::io("read", &route.file))?;
        Document::decode(&bytes, route.codec.as_ref()).map_err(|source| StoreError::Codec {
            path: route.file.clone(),
            source,
        })
    }

    /// Load the document, creating an empty file first if it is missing.
    pub async fn load_or_create(&self, route: &Route) -> Result<Document, StoreError> {
        self.remove_stale_temps(route).await?;

        if self.exists(route).await? {
            return self.load(route).await;
        }

        if let Some(parent) = route.file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(StoreError::io("create directory", parent))?;
        }
        fs::File::create(&route.file)
            .await
            .map_err(StoreError::io("create", &route.file))?;

        tracing::info!(file = ?route.file, route = %route.label(), "Created document");
        Ok(Document::default())
    }

    /// Encode the whole document and swap it in place of the old file.
    pub async fn replace(&self, route: &Route, document: &Document) -> Result<(), StoreError> {
        let bytes = document
            .encode(route.codec.as_ref())
            .map_err(|source| StoreError::Codec {
                path: route.file.clone(),
                source,
            })?;

        let parent = route.file.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .await
            .map_err(StoreError::io("create directory", parent))?;

        let temp = parent.join(format!(".{}.{}.tmp", file_name(route), Uuid::new_v4().simple()));

        fs::write(&temp, &bytes)
            .await
            .map_err(StoreError::io("write", &temp))?;
        if let Err(e) = fs::rename(&temp, &route.file).await {
            let _ = fs::remove_file(&temp).await;
            return Err(StoreError::Io {
                op: "replace",
                path: route.file.clone(),
                source: e,
            });
        }

        metrics::record_document_write(route.codec.name());
        tracing::debug!(file = ?route.file, bytes = bytes.len(), "Document rewritten");
        Ok(())
    }

    /// Delete temp files of this document left by an interrupted `replace`.
    ///
    /// Only safe under the file's exclusive lock.
    async fn remove_stale_temps(&self, route: &Route) -> Result<(), StoreError> {
        let Some(parent) = route.file.parent() else {
            return Ok(());
        };
        let mut entries = match fs::read_dir(parent).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io("list", parent)(e)),
        };

        let target = file_name(route);
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(StoreError::io("list", parent))?
        {
            if !is_temp_of(&target, &entry.file_name().to_string_lossy()) {
                continue;
            }
            let path = entry.path();
            match fs::remove_file(&path).await {
                Ok(()) => tracing::warn!(file = ?path, "Removed leftover temp file"),
                Err(e) => tracing::warn!(file = ?path, error = %e, "Failed to remove leftover temp file"),
            }
        }
        Ok(())
    }
}

fn file_name(route: &Route) -> String {
    route
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `candidate` is a `.<target>.<uuid>.tmp` sibling written by `replace`.
fn is_temp_of(target: &str, candidate: &str) -> bool {
    candidate
        .strip_prefix('.')
        .and_then(|rest| rest.strip_prefix(target))
        .and_then(|rest| rest.strip_prefix('.'))
        .and_then(|rest| rest.strip_suffix(".tmp"))
        .is_some_and(|id| id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::config::RouteConfig;
    use serde_json::json;

    fn route(root: &Path, path: &str) -> Route {
        let config = RouteConfig {
            path: path.to_string(),
            ..Default::default()
        };
        Route::from_config(&config, root, &CodecRegistry::default()).unwrap()
    }

    #[tokio::test]
    async fn test_exists_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let route = route(dir.path(), "/users");

        assert!(!store.exists(&route).await.unwrap());
        assert!(!route.file.exists());
    }

    #[tokio::test]
    async fn test_load_or_create_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let route = route(dir.path(), "/nested/users");

        let doc = store.load_or_create(&route).await.unwrap();
        assert_eq!(doc, Document::default());
        assert!(route.file.exists());

        // The blank file it left behind reads back as an empty document.
        assert_eq!(store.load(&route).await.unwrap(), Document::default());
    }

    #[tokio::test]
    async fn test_replace_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let route = route(dir.path(), "/users");

        let doc = Document {
            data: vec![json!({"id": "a"})],
            ..Default::default()
        };
        store.replace(&route, &doc).await.unwrap();

        assert_eq!(store.load(&route).await.unwrap(), doc);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_is_temp_of() {
        let id = Uuid::new_v4().simple().to_string();
        assert!(is_temp_of("users.json", &format!(".users.json.{}.tmp", id)));
        assert!(!is_temp_of("users.json", &format!(".users.json.bak.{}.tmp", id)));
        assert!(!is_temp_of("users.json", ".users.json.tmp"));
        assert!(!is_temp_of("users.json", "users.json"));
    }

    #[tokio::test]
    async fn test_load_or_create_sweeps_interrupted_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let route = route(dir.path(), "/users");

        let id = Uuid::new_v4().simple().to_string();
        let stale = dir.path().join(format!(".users.json.{}.tmp", id));
        let unrelated = dir.path().join(format!(".orders.json.{}.tmp", id));
        std::fs::write(&stale, "{\"data\": []").unwrap();
        std::fs::write(&unrelated, "{}").unwrap();

        store.load_or_create(&route).await.unwrap();
        assert!(!stale.exists());
        assert!(unrelated.exists());
        assert!(route.file.exists());
    }

    #[tokio::test]
    async fn test_load_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new();
        let route = route(dir.path(), "/users");
        std::fs::write(&route.file, "{oops").unwrap();

        let err = store.load(&route).await.unwrap_err();
        assert!(matches!(err, StoreError::Codec { .. }));
        assert_eq!(std::fs::read_to_string(&route.file).unwrap(), "{oops");
    }
}
