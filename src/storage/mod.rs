// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in two places under the data directory:
//!
//! - a redb database holding users, the token registry, file metadata and
//!   share links ([`Database`] plus the typed repositories)
//! - a plain directory tree holding uploaded bytes ([`BlobStore`])
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/
//!   fileshare.redb
//!   uploads/
//!     {owner_id}/
//!       {file_id}{.ext}
//! ```
//!
//! [`LookupCache`] sits in front of the two hot read paths (listings and
//! share resolution) and is never the source of truth.

pub mod blobs;
pub mod cache;
pub mod database;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use blobs::{BlobError, BlobResult, BlobStore};
pub use cache::LookupCache;
pub use database::{Database, DbError, DbResult};
pub use ownership::{OwnedBy, OwnedResource};
pub use paths::StoragePaths;
pub use repository::{
    FileRepository, ShareRepository, ShareResolution, StoredFile, StoredShare, StoredToken,
    StoredUser, TokenRepository, UserRepository,
};
