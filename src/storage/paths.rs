// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk layout.
//!
//! ```text
//! {data_dir}/
//!   fileshare.redb          # metadata database
//!   uploads/
//!     {owner_id}/
//!       {file_id}{.ext}     # uploaded blobs
//! ```

use std::path::{Path, PathBuf};

/// Default data directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "./data";

const DATABASE_FILE: &str = "fileshare.redb";
const UPLOADS_DIR: &str = "uploads";

/// Longest extension carried over from a client-supplied filename.
const MAX_EXTENSION_LEN: usize = 16;

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the embedded metadata database.
    pub fn database(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    /// Root directory of the blob store.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }
}

// ========== Blob Locators ==========

/// Stored filename for an upload: the file id plus the original extension,
/// when that extension is short and alphanumeric.
pub fn stored_file_name(file_id: &str, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => format!("{file_id}.{}", ext.to_ascii_lowercase()),
        None => file_id.to_string(),
    }
}

/// Blob store locator of a stored file: always inside the owner's subtree.
pub fn blob_locator(owner_id: &str, stored_name: &str) -> String {
    format!("{owner_id}/{stored_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_root() {
        let paths = StoragePaths::new("/srv/data");
        assert_eq!(paths.database(), PathBuf::from("/srv/data/fileshare.redb"));
        assert_eq!(paths.uploads_dir(), PathBuf::from("/srv/data/uploads"));
    }

    #[test]
    fn stored_name_keeps_extension() {
        assert_eq!(stored_file_name("abc", "Report.PDF"), "abc.pdf");
        assert_eq!(stored_file_name("abc", "archive.tar.gz"), "abc.gz");
    }

    #[test]
    fn stored_name_drops_suspicious_extensions() {
        assert_eq!(stored_file_name("abc", "noext"), "abc");
        assert_eq!(stored_file_name("abc", "evil.p/hp"), "abc");
        assert_eq!(stored_file_name("abc", "x.aaaaaaaaaaaaaaaaaaaaaaaa"), "abc");
        assert_eq!(stored_file_name("abc", ".bashrc"), "abc");
    }

    #[test]
    fn locator_is_owner_scoped() {
        assert_eq!(blob_locator("owner-1", "abc.pdf"), "owner-1/abc.pdf");
    }
}
