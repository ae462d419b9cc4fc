// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # File Metadata Store
//!
//! Pairs the blob store with the metadata database. An upload writes the
//! blob first and the metadata row second; if the row cannot be written the
//! blob is deleted once so no unreferenced bytes are left behind. A crash
//! between the two steps can still orphan a blob, which is left for an
//! external sweep.

use axum::http::HeaderValue;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::paths::{blob_locator, stored_file_name};
use crate::storage::{
    BlobError, BlobStore, Database, DbError, FileRepository, LookupCache, StoredFile,
};

/// MIME type recorded when the client sends none (or an unusable one).
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file cannot be empty")]
    EmptyFile,

    /// Missing, or owned by someone else.
    #[error("file not found")]
    NotFound,

    #[error(transparent)]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// A received upload, before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub original_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct FileStore<'a> {
    db: &'a Database,
    blobs: &'a BlobStore,
    cache: &'a LookupCache,
}

impl<'a> FileStore<'a> {
    pub fn new(db: &'a Database, blobs: &'a BlobStore, cache: &'a LookupCache) -> Self {
        Self { db, blobs, cache }
    }

    /// Persist an upload for `owner_id`.
    pub fn create_file(&self, owner_id: &str, upload: NewUpload) -> Result<StoredFile, FileError> {
        if upload.bytes.is_empty() {
            return Err(FileError::EmptyFile);
        }

        let id = Uuid::new_v4().to_string();
        let name = stored_file_name(&id, &upload.original_name);
        let storage_path = blob_locator(owner_id, &name);

        let file = StoredFile {
            url: format!("/files/{id}"),
            id,
            owner_id: owner_id.to_string(),
            name,
            original_name: upload.original_name,
            storage_path,
            size: upload.bytes.len() as u64,
            mime_type: sanitize_mime_type(upload.mime_type.as_deref()),
            is_public: false,
            created_at: Utc::now(),
        };

        self.blobs.put(&file.storage_path, &upload.bytes)?;
        self.insert_or_discard_blob(&file)?;

        self.cache.invalidate_listing(owner_id);

        tracing::info!(
            user_id = %owner_id,
            file_id = %file.id,
            size = file.size,
            "file uploaded"
        );
        Ok(file)
    }

    /// Insert the metadata row for a blob that is already written. If the
    /// insert fails the blob is deleted once; a failed delete is logged and
    /// the insert error is returned.
    fn insert_or_discard_blob(&self, file: &StoredFile) -> Result<(), FileError> {
        if let Err(e) = FileRepository::new(self.db).insert(file) {
            if let Err(cleanup) = self.blobs.delete(&file.storage_path) {
                tracing::error!(
                    file_id = %file.id,
                    error = %cleanup,
                    "failed to remove blob after metadata insert failure"
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// An owner's files, newest first.
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredFile>, FileError> {
        if let Some(files) = self.cache.get_listing(owner_id) {
            return Ok(files);
        }
        let read_at = self.cache.listing_generation();
        let files = FileRepository::new(self.db).list_by_owner(owner_id)?;
        self.cache.put_listing(owner_id, files.clone(), read_at);
        Ok(files)
    }

    /// Ownership-scoped lookup; another owner's file is `NotFound`.
    pub fn get_for_owner(&self, file_id: &str, owner_id: &str) -> Result<StoredFile, FileError> {
        FileRepository::new(self.db)
            .get_for_owner(file_id, owner_id)?
            .ok_or(FileError::NotFound)
    }

    /// Read the bytes of a file already authorized for the caller.
    pub fn read_blob(&self, storage_path: &str) -> Result<Vec<u8>, FileError> {
        match self.blobs.get(storage_path) {
            Ok(bytes) => Ok(bytes),
            Err(BlobError::NotFound(_)) => Err(FileError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep a client-supplied MIME type only if it can be echoed back as a
/// header value and looks like `type/subtype`.
pub fn sanitize_mime_type(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|m| m.contains('/') && HeaderValue::from_str(m).is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        db: Database,
        blobs: BlobStore,
        cache: LookupCache,
        _dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let db = Database::open(&dir.path().join("meta.redb")).unwrap();
            let blobs = BlobStore::new(dir.path().join("uploads"));
            blobs.initialize().unwrap();
            let cache = LookupCache::new(16, Duration::from_secs(300), Duration::from_secs(3600));
            Self {
                db,
                blobs,
                cache,
                _dir: dir,
            }
        }

        fn store(&self) -> FileStore<'_> {
            FileStore::new(&self.db, &self.blobs, &self.cache)
        }
    }

    fn upload(name: &str, bytes: &[u8]) -> NewUpload {
        NewUpload {
            original_name: name.to_string(),
            mime_type: Some("text/plain".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn create_file_writes_blob_and_metadata() {
        let fx = Fixture::new();
        let file = fx.store().create_file("alice", upload("notes.txt", b"hello")).unwrap();

        assert_eq!(file.name, format!("{}.txt", file.id));
        assert_eq!(file.storage_path, format!("alice/{}.txt", file.id));
        assert_eq!(file.url, format!("/files/{}", file.id));
        assert_eq!(file.size, 5);
        assert!(!file.is_public);
        assert_eq!(fx.blobs.get(&file.storage_path).unwrap(), b"hello");
        assert_eq!(fx.store().get_for_owner(&file.id, "alice").unwrap(), file);
    }

    #[test]
    fn empty_upload_rejected_before_any_write() {
        let fx = Fixture::new();
        let result = fx.store().create_file("alice", upload("empty.txt", b""));
        assert!(matches!(result, Err(FileError::EmptyFile)));

        assert!(fx.store().list_by_owner("alice").unwrap().is_empty());
        assert!(!fx.blobs.root().join("alice").exists());
    }

    #[test]
    fn listing_reflects_new_upload_after_cache_populated() {
        let fx = Fixture::new();
        let store = fx.store();
        let first = store.create_file("alice", upload("a.txt", b"a")).unwrap();

        let cached = store.list_by_owner("alice").unwrap();
        assert_eq!(cached.len(), 1);
        assert!(fx.cache.get_listing("alice").is_some());

        std::thread::sleep(Duration::from_millis(2));
        let second = store.create_file("alice", upload("b.txt", b"b")).unwrap();
        let ids: Vec<String> = store
            .list_by_owner("alice")
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn listing_read_racing_an_upload_is_not_cached() {
        let fx = Fixture::new();
        let store = fx.store();

        // A reader misses the cache and reads the database...
        let read_at = fx.cache.listing_generation();
        let before = FileRepository::new(&fx.db).list_by_owner("alice").unwrap();
        assert!(before.is_empty());

        // ...an upload commits and invalidates...
        let file = store.create_file("alice", upload("a.txt", b"a")).unwrap();

        // ...then the reader stores what it read.
        fx.cache.put_listing("alice", before, read_at);

        assert!(fx.cache.get_listing("alice").is_none());
        let listed = store.list_by_owner("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, file.id);
    }

    #[test]
    fn other_owner_sees_not_found() {
        let fx = Fixture::new();
        let file = fx.store().create_file("alice", upload("a.txt", b"a")).unwrap();
        assert!(matches!(
            fx.store().get_for_owner(&file.id, "mallory"),
            Err(FileError::NotFound)
        ));
        assert!(matches!(
            fx.store().get_for_owner("missing", "alice"),
            Err(FileError::NotFound)
        ));
    }

    #[test]
    fn failed_metadata_insert_removes_blob() {
        let fx = Fixture::new();
        let store = fx.store();
        let file = store.create_file("alice", upload("a.txt", b"a")).unwrap();

        let duplicate = StoredFile {
            storage_path: "alice/orphan.txt".to_string(),
            ..file.clone()
        };
        fx.blobs.put(&duplicate.storage_path, b"x").unwrap();

        let result = store.insert_or_discard_blob(&duplicate);
        assert!(matches!(result, Err(FileError::Db(DbError::AlreadyExists(_)))));
        assert!(!fx.blobs.exists(&duplicate.storage_path));
        assert!(fx.blobs.exists(&file.storage_path));
    }

    #[test]
    fn read_blob_missing_is_not_found() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.store().read_blob("alice/gone.txt"),
            Err(FileError::NotFound)
        ));
    }

    #[test]
    fn mime_type_sanitized() {
        assert_eq!(sanitize_mime_type(Some("image/png")), "image/png");
        assert_eq!(sanitize_mime_type(None), DEFAULT_MIME_TYPE);
        assert_eq!(sanitize_mime_type(Some("garbage")), DEFAULT_MIME_TYPE);
        assert_eq!(sanitize_mime_type(Some("text/html\r\nX: y")), DEFAULT_MIME_TYPE);
    }
}
