// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment exactly once at startup and
//! frozen into an [`AppConfig`]. Request handling never touches the
//! environment; the config (or the pieces derived from it) is injected
//! through [`crate::state::AppState`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC signing secret, at least 32 bytes | Required |
//! | `JWT_EXPIRATION_HOURS` | Bearer token lifetime (1 to 876600) | `24` |
//! | `DATA_DIR` | Root for the metadata database and uploaded blobs | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SHARE_TTL_HOURS` | Lifetime of a share link (1 to 876600) | `168` |
//! | `LISTING_CACHE_TTL_SECS` | TTL of cached file listings | `300` |
//! | `SHARE_CACHE_TTL_SECS` | Upper bound on cached share resolutions | `3600` |
//! | `CACHE_CAPACITY` | Entries per cache keyspace | `1024` |
//! | `CACHE_ENABLED` | Disable to bypass the lookup cache entirely | `true` |
//! | `MAX_UPLOAD_BYTES` | Largest accepted request body | `33554432` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout | `30` |
//! | `TOKEN_PURGE_INTERVAL_SECS` | Janitor sweep interval for expired tokens | `3600` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::storage::paths::{StoragePaths, DEFAULT_DATA_DIR};

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRATION_HOURS_ENV: &str = "JWT_EXPIRATION_HOURS";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SHARE_TTL_HOURS_ENV: &str = "SHARE_TTL_HOURS";
pub const LISTING_CACHE_TTL_ENV: &str = "LISTING_CACHE_TTL_SECS";
pub const SHARE_CACHE_TTL_ENV: &str = "SHARE_CACHE_TTL_SECS";
pub const CACHE_CAPACITY_ENV: &str = "CACHE_CAPACITY";
pub const CACHE_ENABLED_ENV: &str = "CACHE_ENABLED";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const TOKEN_PURGE_INTERVAL_ENV: &str = "TOKEN_PURGE_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_TOKEN_HOURS: u64 = 24;
const DEFAULT_SHARE_HOURS: u64 = 7 * 24;
const DEFAULT_LISTING_CACHE_SECS: u64 = 5 * 60;
const DEFAULT_SHARE_CACHE_SECS: u64 = 60 * 60;
const DEFAULT_CACHE_CAPACITY: usize = 1024;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60 * 60;

/// Upper bound on token and share lifetimes (100 years). Keeps
/// `now + lifetime` representable as a timestamp.
pub const MAX_LIFETIME_HOURS: u64 = 100 * 365 * 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{JWT_SECRET_ENV} is required")]
    MissingSecret,

    #[error("{JWT_SECRET_ENV} must be at least {MIN_SECRET_LEN} bytes long")]
    SecretTooShort,

    #[error("{name} must be a positive integer, got {value:?}")]
    NotPositive { name: &'static str, value: String },

    #[error("{name} must be at most {max} hours, got {value}")]
    LifetimeTooLong { name: &'static str, value: u64, max: u64 },

    #[error("{name} is not a valid boolean: {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("invalid bind address {0}")]
    InvalidAddress(String),

    #[error("{LOG_FORMAT_ENV} must be `json` or `pretty`, got {0:?}")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Immutable process configuration.
///
/// The secret is held as raw bytes; `Debug` output redacts it.
#[derive(Clone)]
pub struct AppConfig {
    pub jwt_secret: Vec<u8>,
    pub token_lifetime: Duration,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub share_lifetime: Duration,
    pub listing_cache_ttl: Duration,
    pub share_cache_ttl: Duration,
    pub cache_capacity: usize,
    pub cache_enabled: bool,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub token_purge_interval: Duration,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("share_lifetime", &self.share_lifetime)
            .field("listing_cache_ttl", &self.listing_cache_ttl)
            .field("share_cache_ttl", &self.share_cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_enabled", &self.cache_enabled)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("request_timeout", &self.request_timeout)
            .field("token_purge_interval", &self.token_purge_interval)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Every value is validated here so a bad deployment fails at startup
    /// instead of on the first request.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let jwt_secret = get(JWT_SECRET_ENV).ok_or(ConfigError::MissingSecret)?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort);
        }

        let token_lifetime = lifetime_hours(JWT_EXPIRATION_HOURS_ENV, get(JWT_EXPIRATION_HOURS_ENV), DEFAULT_TOKEN_HOURS)?;
        let share_lifetime = lifetime_hours(SHARE_TTL_HOURS_ENV, get(SHARE_TTL_HOURS_ENV), DEFAULT_SHARE_HOURS)?;
        let listing_secs = positive(LISTING_CACHE_TTL_ENV, get(LISTING_CACHE_TTL_ENV), DEFAULT_LISTING_CACHE_SECS)?;
        let share_cache_secs = positive(SHARE_CACHE_TTL_ENV, get(SHARE_CACHE_TTL_ENV), DEFAULT_SHARE_CACHE_SECS)?;
        let cache_capacity = positive(CACHE_CAPACITY_ENV, get(CACHE_CAPACITY_ENV), DEFAULT_CACHE_CAPACITY as u64)?;
        let max_upload = positive(MAX_UPLOAD_BYTES_ENV, get(MAX_UPLOAD_BYTES_ENV), DEFAULT_MAX_UPLOAD_BYTES as u64)?;
        let timeout_secs = positive(REQUEST_TIMEOUT_ENV, get(REQUEST_TIMEOUT_ENV), DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let purge_secs = positive(TOKEN_PURGE_INTERVAL_ENV, get(TOKEN_PURGE_INTERVAL_ENV), DEFAULT_PURGE_INTERVAL_SECS)?;

        let cache_enabled = match get(CACHE_ENABLED_ENV) {
            None => true,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidBool {
                        name: CACHE_ENABLED_ENV,
                        value: raw,
                    })
                }
            },
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = get(PORT_ENV).unwrap_or_else(|| "8080".to_string());
        let addr = format!("{host}:{port}");
        let bind_addr = addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddress(addr))?;

        Ok(Self {
            jwt_secret: jwt_secret.into_bytes(),
            token_lifetime,
            data_dir: get(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            bind_addr,
            share_lifetime,
            listing_cache_ttl: Duration::from_secs(listing_secs),
            share_cache_ttl: Duration::from_secs(share_cache_secs),
            cache_capacity: cache_capacity as usize,
            cache_enabled,
            max_upload_bytes: max_upload as usize,
            request_timeout: Duration::from_secs(timeout_secs),
            token_purge_interval: Duration::from_secs(purge_secs),
            log_format,
        })
    }

    /// On-disk layout rooted at the configured data directory.
    pub fn storage_paths(&self) -> StoragePaths {
        StoragePaths::new(&self.data_dir)
    }
}

fn positive(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::NotPositive { name, value }),
        },
    }
}

fn lifetime_hours(
    name: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let hours = positive(name, raw, default)?;
    if hours > MAX_LIFETIME_HOURS {
        return Err(ConfigError::LifetimeTooLong {
            name,
            value: hours,
            max: MAX_LIFETIME_HOURS,
        });
    }
    Ok(Duration::from_secs(hours * 3600))
}
