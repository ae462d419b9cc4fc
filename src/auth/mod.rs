// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the file store.
//!
//! ## Auth Flow
//!
//! 1. `POST /login` verifies the password, issues an HS256 token and records
//!    it in the token registry before returning it
//! 2. Clients present the token (header, query, form or multipart field)
//! 3. The gate middleware:
//!    - verifies algorithm, signature, structure and `exp`
//!    - reads `sub` → canonical `user_id`
//!    - checks the registry row is still live
//! 4. `POST /logout` deletes the registry row, so the token stops working
//!    even though its signature remains valid
//!
//! ## Security
//!
//! - Tokens and secrets are never logged (only a `jti` prefix)
//! - Password hashes are scrypt PHC strings

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod tokens;

pub use claims::{AuthenticatedUser, Claims};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::{require_auth, Authenticator};
pub use password::{Hasher, PasswordError};
pub use tokens::{IssuedToken, TokenError, TokenIssuer};
