// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive
//! `ToSchema` for the OpenAPI document served at `/docs`.
//!
//! ## Model Categories
//!
//! - **Accounts**: registration, login, current user
//! - **Files**: upload result and listing entries
//! - **Shares**: minted share links

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredFile;

// =============================================================================
// Account Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    /// At least 8 characters.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// The authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MeResponse {
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// File Models
// =============================================================================

/// File metadata as returned right after an upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub user_id: String,
    /// Stored name (`<id><.ext>`).
    pub name: String,
    /// Location relative to the blob root.
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
}

impl From<&StoredFile> for UploadedFile {
    fn from(file: &StoredFile) -> Self {
        Self {
            id: file.id.clone(),
            user_id: file.owner_id.clone(),
            name: file.name.clone(),
            path: file.storage_path.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
            created_at: file.created_at,
            is_public: file.is_public,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UploadResponse {
    pub file: UploadedFile,
    pub message: String,
    /// Canonical access URL of the file.
    pub url: String,
}

/// One entry of `GET /files`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FileSummary {
    pub id: String,
    /// Stored name (`<id>.<ext>`), same as `UploadedFile::name`.
    pub name: String,
    /// Original client-supplied name.
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredFile> for FileSummary {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            filename: file.original_name,
            size: file.size,
            mime_type: file.mime_type,
            path: file.storage_path,
            created_at: file.created_at,
        }
    }
}

// =============================================================================
// Share Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShareLinkResponse {
    /// Relative URL serving the file without authentication.
    pub share_url: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
