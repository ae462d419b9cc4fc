// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share link repository.
//!
//! Share rows are never deleted: an expired link must keep resolving to
//! "expired" rather than "unknown".

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{Database, DbError, DbResult, FILES, FILE_SHARES};
use super::files::StoredFile;

/// Share link row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredShare {
    /// Opaque share token (unique)
    pub token: String,
    /// Shared file
    pub file_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredShare {
    /// A link is expired once `now` has passed its expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// What a share token resolves to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareResolution {
    pub storage_path: String,
    pub name: String,
    pub mime_type: String,
    pub expires_at: DateTime<Utc>,
}

impl ShareResolution {
    pub fn new(share: &StoredShare, file: &StoredFile) -> Self {
        Self {
            storage_path: file.storage_path.clone(),
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            expires_at: share.expires_at,
        }
    }
}

pub struct ShareRepository<'a> {
    db: &'a Database,
}

impl<'a> ShareRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a share row. Tokens are unique.
    pub fn insert(&self, share: &StoredShare) -> DbResult<()> {
        let json = serde_json::to_vec(share)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(FILE_SHARES)?;
            if table.get(share.token.as_str())?.is_some() {
                return Err(DbError::AlreadyExists("Share token".to_string()));
            }
            table.insert(share.token.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a share row by token.
    #[cfg(test)]
    pub fn get(&self, token: &str) -> DbResult<Option<StoredShare>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FILE_SHARES)?;
        let share = match table.get(token)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(share)
    }

    /// Fetch a share row joined with its file, from one read snapshot.
    ///
    /// Returns `None` if the token is unknown or the file row is gone.
    pub fn get_with_file(&self, token: &str) -> DbResult<Option<(StoredShare, StoredFile)>> {
        let read_txn = self.db.begin_read()?;
        let shares = read_txn.open_table(FILE_SHARES)?;
        let share: StoredShare = match shares.get(token)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };

        let files = read_txn.open_table(FILES)?;
        let file: StoredFile = match files.get(share.file_id.as_str())? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(None),
        };

        Ok(Some((share, file)))
    }
}
