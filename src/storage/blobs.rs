// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob store for uploaded file contents.
//!
//! Blobs are addressed by a relative locator (`{owner_id}/{stored_name}`)
//! resolved under the uploads root. Locators are validated so a crafted
//! value can never escape the root.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Error type for blob operations.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob locator: {0}")]
    InvalidLocator(String),

    #[error("health check data mismatch")]
    IntegrityViolation,
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the uploads root. Idempotent.
    pub fn initialize(&self) -> BlobResult<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Write-read-delete round trip against the uploads root. Each call uses its
    /// own file so concurrent checks do not interfere.
    pub fn health_check(&self) -> BlobResult<()> {
        let test_file = self
            .root
            .join(format!(".health_check-{}", uuid::Uuid::new_v4()));
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(BlobError::IntegrityViolation);
        }
        Ok(())
    }

    /// Store bytes at `locator`, creating parent directories as needed.
    ///
    /// The write goes to a temp file first and is renamed into place, so a
    /// reader never observes a partial blob.
    pub fn put(&self, locator: &str, bytes: &[u8]) -> BlobResult<()> {
        let path = self.resolve(locator)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = temp_path_for(&path);
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Read the full contents of a blob.
    pub fn get(&self, locator: &str) -> BlobResult<Vec<u8>> {
        let path = self.resolve(locator)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(locator.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob.
    pub fn delete(&self, locator: &str) -> BlobResult<()> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(locator.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(test)]
    pub fn exists(&self, locator: &str) -> bool {
        self.resolve(locator)
            .map(|path| File::open(path).is_ok())
            .unwrap_or(false)
    }

    /// Map a locator to a path under the root. Only plain relative
    /// components are accepted.
    fn resolve(&self, locator: &str) -> BlobResult<PathBuf> {
        let relative = Path::new(locator);
        let mut components = 0;
        for component in relative.components() {
            match component {
                Component::Normal(_) => components += 1,
                _ => return Err(BlobError::InvalidLocator(locator.to_string())),
            }
        }
        if components == 0 {
            return Err(BlobError::InvalidLocator(locator.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (BlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().join("uploads"));
        store.initialize().unwrap();
        (store, dir)
    }

    #[test]
    fn put_get_delete() {
        let (store, _dir) = store();
        store.put("alice/f1.txt", b"hello").unwrap();
        assert!(store.exists("alice/f1.txt"));
        assert_eq!(store.get("alice/f1.txt").unwrap(), b"hello");

        store.delete("alice/f1.txt").unwrap();
        assert!(!store.exists("alice/f1.txt"));
        assert!(matches!(store.get("alice/f1.txt"), Err(BlobError::NotFound(_))));
    }

    #[test]
    fn put_leaves_no_temp_file() {
        let (store, _dir) = store();
        store.put("alice/f1.txt", b"hello").unwrap();
        let entries: Vec<_> = fs::read_dir(store.root().join("alice"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("f1.txt")]);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (store, _dir) = store();
        assert!(matches!(store.delete("alice/none"), Err(BlobError::NotFound(_))));
    }

    #[test]
    fn rejects_escaping_locators() {
        let (store, _dir) = store();
        for locator in ["../outside", "/etc/passwd", "alice/../../x", "", "./"] {
            assert!(
                matches!(store.put(locator, b"x"), Err(BlobError::InvalidLocator(_))),
                "{locator} accepted"
            );
        }
    }

    #[test]
    fn health_check_passes() {
        let (store, _dir) = store();
        store.health_check().unwrap();
    }

    #[test]
    fn concurrent_health_checks_do_not_collide() {
        let (store, _dir) = store();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        for _ in 0..25 {
                            store.health_check().unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }
}
