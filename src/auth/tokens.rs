// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token issuing and verification (HS256).
//!
//! A token that verifies here is only *authentic*. Whether it is still live
//! is decided by the token registry; see [`super::middleware::Authenticator`].

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

use super::claims::Claims;
use crate::config::MIN_SECRET_LEN;

/// Random bytes in a token id (`jti`).
pub const TOKEN_ID_BYTES: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token is not signed with HS256")]
    WrongAlgorithm,

    #[error("token has expired")]
    Expired,

    #[error("signing secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("random number generation failed")]
    Random,

    #[error("token encoding failed")]
    Encoding,
}

/// A freshly minted token and the facts the registry needs to record it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens with a single server secret.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    rng: SystemRandom,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
            rng: SystemRandom::new(),
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a token for `user_id`, valid for the configured lifetime.
    pub fn issue(&self, user_id: &str) -> Result<IssuedToken, TokenError> {
        let jti = random_hex(&self.rng, TOKEN_ID_BYTES).map_err(|_| TokenError::Random)?;
        let iat = Utc::now().timestamp();
        let exp = i64::try_from(self.lifetime.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or(TokenError::Encoding)?;

        let claims = Claims {
            sub: Some(serde_json::Value::String(user_id.to_string())),
            jti: jti.clone(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            jti,
            issued_at: from_unix(iat)?,
            expires_at: from_unix(exp)?,
        })
    }

    /// Check algorithm, signature, structure and embedded expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != Algorithm::HS256 {
            return Err(TokenError::WrongAlgorithm);
        }

        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
                    _ => TokenError::Malformed,
                }
            })?;
        Ok(data.claims)
    }
}

/// `len` random bytes, hex encoded.
pub fn random_hex(rng: &impl SecureRandom, len: usize) -> Result<String, ring::error::Unspecified> {
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)?;
    Ok(hex::encode(bytes))
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or(TokenError::Encoding)
}
