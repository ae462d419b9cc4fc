// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token registry.
//!
//! Every bearer token handed out at login has a row here. The registry, not
//! the signature, decides whether a token is still live: a token is accepted
//! only while its row exists, belongs to the presenting subject, and has
//! `expires_at > now`. Expired rows are ignored by every query and removed
//! lazily by the janitor.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{Database, DbError, DbResult, AUTH_TOKENS};

/// Registry row for an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

pub struct TokenRepository<'a> {
    db: &'a Database,
}

impl<'a> TokenRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Persist an issued token. Must complete before the token is returned
    /// to the client.
    pub fn record(
        &self,
        token: &str,
        user_id: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let row = StoredToken {
            user_id: user_id.to_string(),
            issued_at,
            expires_at,
        };
        let json = serde_json::to_vec(&row)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUTH_TOKENS)?;
            if table.get(token)?.is_some() {
                return Err(DbError::AlreadyExists("Auth token".to_string()));
            }
            table.insert(token, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn get(&self, token: &str) -> DbResult<Option<StoredToken>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUTH_TOKENS)?;
        match table.get(token)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// True iff a row exists for `(token, user_id)` and has not expired.
    pub fn is_live(&self, token: &str, user_id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUTH_TOKENS)?;
        let row: StoredToken = match table.get(token)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Ok(false),
        };
        Ok(row.user_id == user_id && row.is_live_at(now))
    }

    /// Delete a token row. Returns whether a row was removed.
    pub fn revoke(&self, token: &str) -> DbResult<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(AUTH_TOKENS)?;
            let removed = table.remove(token)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Remove every row whose expiry is at or before `now`.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let write_txn = self.db.begin_write()?;
        let purged = {
            let mut table = write_txn.open_table(AUTH_TOKENS)?;

            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                // Rows that fail to decode are left for manual inspection
                if let Ok(row) = serde_json::from_slice::<StoredToken>(value.value()) {
                    if !row.is_live_at(now) {
                        expired.push(key.value().to_string());
                    }
                }
            }

            for token in &expired {
                table.remove(token.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(purged)
    }
}
