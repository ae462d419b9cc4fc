// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Share Links
//!
//! A share link is an opaque random token granting unauthenticated read
//! access to one file until it expires. Ownership is checked once, when the
//! link is minted.
//!
//! Resolution distinguishes a link that never existed (`NotFound`) from one
//! that existed but has expired (`Expired`).

use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use std::time::Duration;
use thiserror::Error;

use crate::auth::tokens::random_hex;
use crate::storage::{
    Database, DbError, FileRepository, LookupCache, ShareRepository, ShareResolution, StoredShare,
};

/// Random bytes in a share token (hex encoded to twice this length).
pub const SHARE_TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum ShareError {
    /// Unknown token, or (at mint time) a file the requester does not own.
    #[error("share link not found")]
    NotFound,

    #[error("share link expired")]
    Expired,

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("random number generation failed")]
    Random,

    #[error("share lifetime is out of range")]
    LifetimeOutOfRange,
}

pub struct ShareManager<'a> {
    db: &'a Database,
    cache: &'a LookupCache,
    lifetime: Duration,
    rng: SystemRandom,
}

impl<'a> ShareManager<'a> {
    pub fn new(db: &'a Database, cache: &'a LookupCache, lifetime: Duration) -> Self {
        Self {
            db,
            cache,
            lifetime,
            rng: SystemRandom::new(),
        }
    }

    /// Mint a share link for a file owned by `requester_id`.
    pub fn create_share(&self, file_id: &str, requester_id: &str) -> Result<StoredShare, ShareError> {
        let file = FileRepository::new(self.db)
            .get_for_owner(file_id, requester_id)?
            .ok_or(ShareError::NotFound)?;

        let token = random_hex(&self.rng, SHARE_TOKEN_BYTES).map_err(|_| ShareError::Random)?;
        let created_at = Utc::now();
        let expires_at = chrono::Duration::from_std(self.lifetime)
            .ok()
            .and_then(|lifetime| created_at.checked_add_signed(lifetime))
            .ok_or(ShareError::LifetimeOutOfRange)?;
        let share = StoredShare {
            token,
            file_id: file.id,
            created_at,
            expires_at,
        };

        ShareRepository::new(self.db).insert(&share)?;

        tracing::info!(
            user_id = %requester_id,
            file_id = %share.file_id,
            expires_at = %share.expires_at,
            "share link created"
        );
        Ok(share)
    }

    /// Resolve a share token to the file it grants access to.
    pub fn resolve_share(&self, token: &str) -> Result<ShareResolution, ShareError> {
        self.resolve_share_at(token, Utc::now())
    }

    fn resolve_share_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ShareResolution, ShareError> {
        if let Some(resolution) = self.cache.get_share(token) {
            return Ok(resolution);
        }

        let (share, file) = ShareRepository::new(self.db)
            .get_with_file(token)?
            .ok_or(ShareError::NotFound)?;

        if share.is_expired_at(now) {
            return Err(ShareError::Expired);
        }

        let resolution = ShareResolution::new(&share, &file);
        self.cache.put_share(token, resolution.clone());
        Ok(resolution)
    }
}
