// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by a bearer token.
///
/// `sub` is kept loosely typed so a token whose subject is missing or not a
/// string still decodes; [`Claims::subject`] is where that gets rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<serde_json::Value>,

    /// Unique token identifier (hex)
    #[serde(default)]
    pub jti: String,

    /// Issued at (Unix seconds)
    pub iat: i64,

    /// Expiration (Unix seconds)
    pub exp: i64,
}

impl Claims {
    /// The subject as a non-empty string, if it is one.
    pub fn subject(&self) -> Option<&str> {
        match &self.sub {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Short prefix of the token id, safe to log.
    pub fn jti_prefix(&self) -> &str {
        self.jti.get(..8).unwrap_or(&self.jti)
    }
}

/// Identity bound to a request by the authorization gate.
#[derive(Clone)]
pub struct AuthenticatedUser {
    /// Canonical user ID (token `sub` claim)
    pub user_id: String,

    /// Token `jti`
    pub token_id: String,

    /// Token expiration
    pub expires_at: DateTime<Utc>,

    /// The raw bearer token, needed to revoke it on logout
    pub token: String,
}

impl std::fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("user_id", &self.user_id)
            .field("token_id", &self.token_id)
            .field("expires_at", &self.expires_at)
            .field("token", &"<redacted>")
            .finish()
    }
}
