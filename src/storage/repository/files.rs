// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File metadata repository.
//!
//! Each file row records who owns it and where its bytes live in the blob
//! store. A secondary index keyed by owner and inverted creation time serves
//! newest-first listings with a single range scan.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{
    make_owner_index_key, make_owner_prefix, make_owner_prefix_end, Database, DbError, DbResult,
    FILES, OWNER_FILE_INDEX,
};
use super::super::ownership::{OwnedBy, OwnedResource};

/// File metadata row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    /// Unique file identifier (UUID), also the stored filename stem
    pub id: String,
    /// Owning user id
    pub owner_id: String,
    /// Stored name (`<id><.ext>`)
    pub name: String,
    /// Name supplied by the client at upload time
    pub original_name: String,
    /// Blob store locator, relative to the blob root, under the owner's subtree
    pub storage_path: String,
    /// Size in bytes
    pub size: u64,
    pub mime_type: String,
    pub is_public: bool,
    /// Canonical access URL
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl OwnedResource for StoredFile {
    fn owner_user_id(&self) -> &str {
        &self.owner_id
    }
}

pub struct FileRepository<'a> {
    db: &'a Database,
}

impl<'a> FileRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a file row and its owner index entry in one transaction.
    pub fn insert(&self, file: &StoredFile) -> DbResult<()> {
        let json = serde_json::to_vec(file)?;
        let index_key =
            make_owner_index_key(&file.owner_id, file.created_at.timestamp_micros(), &file.id);

        let write_txn = self.db.begin_write()?;
        {
            let mut files = write_txn.open_table(FILES)?;
            if files.get(file.id.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!("File {}", file.id)));
            }
            files.insert(file.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(OWNER_FILE_INDEX)?;
            index.insert(index_key.as_slice(), file.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a file by id regardless of owner.
    pub fn get(&self, file_id: &str) -> DbResult<Option<StoredFile>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FILES)?;
        let file = match table.get(file_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(file)
    }

    /// Ownership-scoped lookup. A file owned by someone else is reported
    /// exactly like a missing one.
    pub fn get_for_owner(&self, file_id: &str, owner_id: &str) -> DbResult<Option<StoredFile>> {
        Ok(self.get(file_id)?.owned_by(owner_id))
    }

    /// All files of an owner, newest first.
    pub fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<StoredFile>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(OWNER_FILE_INDEX)?;
        let files = read_txn.open_table(FILES)?;

        let start = make_owner_prefix(owner_id);
        let end = make_owner_prefix_end(owner_id);

        let mut results = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, file_id) = entry?;
            if let Some(value) = files.get(file_id.value())? {
                let file: StoredFile = serde_json::from_slice(value.value())?;
                results.push(file);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn file(id: &str, owner: &str, created_at: DateTime<Utc>) -> StoredFile {
        StoredFile {
            id: id.to_string(),
            owner_id: owner.to_string(),
            name: format!("{id}.txt"),
            original_name: "notes.txt".to_string(),
            storage_path: format!("{owner}/{id}.txt"),
            size: 5,
            mime_type: "text/plain".to_string(),
            is_public: false,
            url: format!("/files/{id}"),
            created_at,
        }
    }

    #[test]
    fn list_is_newest_first_and_scoped_to_owner() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);
        let now = Utc::now();

        repo.insert(&file("f-old", "alice", now - Duration::minutes(10))).unwrap();
        repo.insert(&file("f-new", "alice", now)).unwrap();
        repo.insert(&file("f-mid", "alice", now - Duration::minutes(5))).unwrap();
        repo.insert(&file("f-bob", "bob", now)).unwrap();

        let ids: Vec<String> = repo
            .list_by_owner("alice")
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["f-new", "f-mid", "f-old"]);
        assert_eq!(repo.list_by_owner("bob").unwrap().len(), 1);
        assert!(repo.list_by_owner("carol").unwrap().is_empty());
    }

    #[test]
    fn get_for_owner_hides_other_owners_files() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);
        repo.insert(&file("f1", "alice", Utc::now())).unwrap();

        assert!(repo.get_for_owner("f1", "alice").unwrap().is_some());
        assert!(repo.get_for_owner("f1", "bob").unwrap().is_none());
        assert!(repo.get_for_owner("missing", "alice").unwrap().is_none());
    }

    #[test]
    fn duplicate_id_rejected() {
        let (db, _dir) = test_db();
        let repo = FileRepository::new(&db);
        repo.insert(&file("f1", "alice", Utc::now())).unwrap();
        let result = repo.insert(&file("f1", "alice", Utc::now()));
        assert!(matches!(result, Err(DbError::AlreadyExists(_))));
        assert_eq!(repo.list_by_owner("alice").unwrap().len(), 1);
    }
}
