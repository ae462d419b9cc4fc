// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{password, Authenticator, TokenError, TokenIssuer};
use crate::config::AppConfig;
use crate::files::FileStore;
use crate::shares::ShareManager;
use crate::storage::{BlobError, BlobStore, Database, DbError, LookupCache};

/// Failures while assembling the application state at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database: {0}")]
    Database(#[from] DbError),

    #[error("blob store: {0}")]
    Blobs(#[from] BlobError),

    #[error("token issuer: {0}")]
    Tokens(#[from] TokenError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub blobs: Arc<BlobStore>,
    pub cache: Arc<LookupCache>,
    pub tokens: Arc<TokenIssuer>,
    pub passwords: Arc<password::Hasher>,
}

impl AppState {
    /// Open storage under the configured data directory and build the
    /// shared services.
    pub fn new(config: AppConfig) -> Result<Self, StartupError> {
        Self::with_hasher(config, password::Hasher::default())
    }

    pub fn with_hasher(config: AppConfig, passwords: password::Hasher) -> Result<Self, StartupError> {
        let paths = config.storage_paths();

        let db = Database::open(&paths.database())?;
        let blobs = BlobStore::new(paths.uploads_dir());
        blobs.initialize()?;

        let cache = if config.cache_enabled {
            LookupCache::new(
                config.cache_capacity,
                config.listing_cache_ttl,
                config.share_cache_ttl,
            )
        } else {
            LookupCache::disabled()
        };

        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_lifetime)?;

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            blobs: Arc::new(blobs),
            cache: Arc::new(cache),
            tokens: Arc::new(tokens),
            passwords: Arc::new(passwords),
        })
    }

    pub fn files(&self) -> FileStore<'_> {
        FileStore::new(&self.db, &self.blobs, &self.cache)
    }

    pub fn shares(&self) -> ShareManager<'_> {
        ShareManager::new(&self.db, &self.cache, self.config.share_lifetime)
    }

    pub fn authenticator(&self) -> Authenticator<'_> {
        Authenticator::new(&self.tokens, &self.db)
    }
}
