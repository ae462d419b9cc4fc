// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store: user records and their password hashes.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{Database, DbError, DbResult, USERS, USER_EMAIL_INDEX};

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Normalized email address (unique)
    pub email: String,
    /// PHC-formatted password hash
    pub password_hash: String,
    /// When the user registered
    pub created_at: DateTime<Utc>,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user records.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new user.
    ///
    /// Fails with `AlreadyExists` if the email (or id) is taken; the check and
    /// the insert run in the same write transaction.
    pub fn create(&self, user: &StoredUser) -> DbResult<()> {
        let email = normalize_email(&user.email);
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut emails = write_txn.open_table(USER_EMAIL_INDEX)?;
            if emails.get(email.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!("User with email {email}")));
            }

            let mut users = write_txn.open_table(USERS)?;
            if users.get(user.id.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!("User {}", user.id)));
            }

            users.insert(user.id.as_str(), json.as_slice())?;
            emails.insert(email.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a user by id.
    pub fn get(&self, user_id: &str) -> DbResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        let user = match table.get(user_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(user)
    }

    /// Look up a user by email (normalized before lookup).
    pub fn find_by_email(&self, email: &str) -> DbResult<Option<StoredUser>> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAIL_INDEX)?;
        let user_id = match emails.get(email.as_str())? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        let user = match users.get(user_id.as_str())? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(user)
    }

    /// Whether an account already uses this email.
    pub fn email_exists(&self, email: &str) -> DbResult<bool> {
        let email = normalize_email(email);
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAIL_INDEX)?;
        let exists = emails.get(email.as_str())?.is_some();
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn user(id: &str, email: &str) -> StoredUser {
        StoredUser {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "$scrypt$fake".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_find_by_email() {
        let (db, _dir) = test_db();
        let repo = UserRepository::new(&db);
        repo.create(&user("u1", "alice@example.com")).unwrap();

        let found = repo.find_by_email("  Alice@Example.COM ").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(repo.get("u1").unwrap().unwrap().email, "alice@example.com");
        assert!(repo.email_exists("alice@example.com").unwrap());
    }

    #[test]
    fn duplicate_email_rejected() {
        let (db, _dir) = test_db();
        let repo = UserRepository::new(&db);
        repo.create(&user("u1", "bob@example.com")).unwrap();

        let result = repo.create(&user("u2", "BOB@example.com"));
        assert!(matches!(result, Err(DbError::AlreadyExists(_))));
        assert!(repo.get("u2").unwrap().is_none());
    }

    #[test]
    fn unknown_email_is_none() {
        let (db, _dir) = test_db();
        let repo = UserRepository::new(&db);
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
        assert!(!repo.email_exists("nobody@example.com").unwrap());
    }
}
