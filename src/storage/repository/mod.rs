// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the metadata database.
//!
//! Each repository borrows the [`Database`](super::Database) and owns the
//! serialization of one record type.

pub mod files;
pub mod shares;
pub mod tokens;
pub mod users;

pub use files::{FileRepository, StoredFile};
pub use shares::{ShareRepository, ShareResolution, StoredShare};
pub use tokens::{StoredToken, TokenRepository};
pub use users::{normalize_email, StoredUser, UserRepository};
