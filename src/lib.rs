// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fileshare - Multi-tenant File Store
//!
//! Authenticated users upload files, list and download their own files, and
//! hand out time-limited public share links.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - HS256 bearer tokens, token registry gate, password hashing
//! - `files` - File metadata plus blob storage
//! - `shares` - Share link creation and resolution
//! - `storage` - redb metadata, on-disk blobs, lookup cache
//! - `janitor` - Background purge of expired tokens

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod janitor;
pub mod models;
pub mod shares;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testutil;
