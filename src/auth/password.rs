// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! scrypt password hashing, stored as PHC strings.
//!
//! Hashing is CPU-bound; call these from `spawn_blocking`.

use std::sync::OnceLock;

use ring::rand::{SecureRandom, SystemRandom};
use scrypt::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use scrypt::{Params, Scrypt};
use thiserror::Error;

const SALT_BYTES: usize = 16;

/// Hashed once per hasher and verified against when the account is unknown.
const DUMMY_PASSWORD: &str = "unknown-account";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("random number generation failed")]
    Random,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("invalid scrypt parameters")]
    InvalidParams,
}

/// Password hasher with fixed cost parameters.
#[derive(Debug, Clone)]
pub struct Hasher {
    params: Params,
    dummy: OnceLock<String>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
            dummy: OnceLock::new(),
        }
    }
}

impl Hasher {
    /// Hasher with explicit cost parameters (low values for tests).
    pub fn with_params(log_n: u8, r: u32, p: u32) -> Result<Self, PasswordError> {
        let params = Params::new(log_n, r, p, Params::RECOMMENDED_LEN)
            .map_err(|_| PasswordError::InvalidParams)?;
        Ok(Self {
            params,
            dummy: OnceLock::new(),
        })
    }

    /// Hash a password into a PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        SystemRandom::new()
            .fill(&mut salt_bytes)
            .map_err(|_| PasswordError::Random)?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

        let hash = Scrypt
            .hash_password_customized(password.as_bytes(), None, None, self.params, &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC string. A malformed stored
    /// hash never verifies.
    pub fn verify(&self, password: &str, phc: &str) -> bool {
        match PasswordHash::new(phc) {
            Ok(parsed) => Scrypt.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }

    /// Verification for an account that does not exist. Does the same
    /// scrypt work as [`Self::verify`] so response timing does not reveal
    /// which emails are registered. Always `false`.
    pub fn verify_unknown(&self, password: &str) -> bool {
        if self.dummy.get().is_none() {
            match self.hash(DUMMY_PASSWORD) {
                Ok(phc) => {
                    let _ = self.dummy.set(phc);
                }
                Err(e) => tracing::warn!(error = %e, "failed to prepare dummy password hash"),
            }
        }
        if let Some(phc) = self.dummy.get() {
            let _ = self.verify(password, phc);
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn has_dummy_hash(&self) -> bool {
        self.dummy.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Hasher {
        Hasher::with_params(4, 8, 1).unwrap()
    }

    #[test]
    fn hash_and_verify() {
        let hasher = fast();
        let phc = hasher.hash("correct horse").unwrap();
        assert!(phc.starts_with("$scrypt$"));
        assert!(hasher.verify("correct horse", &phc));
        assert!(!hasher.verify("wrong horse", &phc));
    }

    #[test]
    fn salts_differ() {
        let hasher = fast();
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn unknown_account_runs_a_real_verification() {
        let hasher = fast();
        assert!(hasher.dummy.get().is_none());

        assert!(!hasher.verify_unknown("anything"));
        let phc = hasher.dummy.get().unwrap().clone();
        assert!(phc.starts_with("$scrypt$"));

        assert!(!hasher.verify_unknown(DUMMY_PASSWORD));
        assert_eq!(hasher.dummy.get().unwrap(), &phc);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!fast().verify("pw", "not-a-phc-string"));
    }
}
