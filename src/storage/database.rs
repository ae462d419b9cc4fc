// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded metadata database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_email_index`: normalized email → user_id (uniqueness)
//! - `auth_tokens`: bearer token → serialized StoredToken
//! - `files`: file_id → serialized StoredFile
//! - `owner_file_index`: composite key (owner|!created_at|file_id) → file_id
//! - `file_shares`: share token → serialized StoredShare
//!
//! redb serializes write transactions, so a "check then insert" inside one
//! write transaction is the uniqueness constraint for emails and tokens.

use std::path::Path;

use redb::{ReadTransaction, ReadableDatabase, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

pub(crate) const USER_EMAIL_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("user_email_index");

pub(crate) const AUTH_TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("auth_tokens");

pub(crate) const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Key format: `owner_id | !created_at_micros_be | file_id` for newest-first scans.
pub(crate) const OWNER_FILE_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("owner_file_index");

pub(crate) const FILE_SHARES: TableDefinition<&str, &[u8]> = TableDefinition::new("file_shares");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the owner_file_index table.
///
/// The inverted timestamp makes a forward scan return the newest file first.
pub(crate) fn make_owner_index_key(owner_id: &str, created_at_micros: i64, file_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner_id.len() + 1 + 8 + 1 + file_id.len());
    key.extend_from_slice(owner_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!(created_at_micros as u64)).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(file_id.as_bytes());
    key
}

/// Lower bound of a range scan over one owner's files.
pub(crate) fn make_owner_prefix(owner_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(owner_id.len() + 1);
    prefix.extend_from_slice(owner_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound of a range scan over one owner's files.
pub(crate) fn make_owner_prefix_end(owner_id: &str) -> Vec<u8> {
    let mut end = Vec::with_capacity(owner_id.len() + 1);
    end.extend_from_slice(owner_id.as_bytes());
    // '|' + 1: sorts after every key carrying the `owner|` prefix
    end.push(b'|' + 1);
    end
}

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID metadata database.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAIL_INDEX)?;
            let _ = write_txn.open_table(AUTH_TOKENS)?;
            let _ = write_txn.open_table(FILES)?;
            let _ = write_txn.open_table(OWNER_FILE_INDEX)?;
            let _ = write_txn.open_table(FILE_SHARES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_write(&self) -> DbResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> DbResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Readiness check: a read transaction can be opened and a table read.
    pub fn health_check(&self) -> DbResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_tables_and_passes_health_check() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("nested").join("meta.redb")).unwrap();
        db.health_check().unwrap();
    }

    #[test]
    fn reopen_existing_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("meta.redb");
        drop(Database::open(&path).unwrap());
        Database::open(&path).unwrap().health_check().unwrap();
    }

    #[test]
    fn newer_files_sort_first() {
        let older = make_owner_index_key("owner", 1_000, "a");
        let newer = make_owner_index_key("owner", 2_000, "b");
        assert!(newer < older);
    }

    #[test]
    fn prefix_bounds_enclose_only_that_owner() {
        let key = make_owner_index_key("owner-1", 5, "f");
        let other = make_owner_index_key("owner-10", 5, "f");
        let start = make_owner_prefix("owner-1");
        let end = make_owner_prefix_end("owner-1");
        assert!(start.as_slice() <= key.as_slice() && key.as_slice() < end.as_slice());
        assert!(!(start.as_slice() <= other.as_slice() && other.as_slice() < end.as_slice()));
    }
}
