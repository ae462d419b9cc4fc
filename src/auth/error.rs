// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;

/// Authentication error type.
///
/// Every rejection from the authorization gate is one of these. Rejections
/// are terminal: the handler never runs and nothing is written.
#[derive(Debug)]
pub enum AuthError {
    /// No token in the header, query string, form or multipart body
    MissingToken,
    /// Token failed signature, algorithm or structural checks
    InvalidToken,
    /// Token verified but carries no usable subject
    MalformedClaims,
    /// Token expired, or no live registry row backs it
    ExpiredOrRevoked,
    /// Login failed (unknown email or wrong password)
    InvalidCredentials,
    /// Internal error
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::MalformedClaims => "malformed_claims",
            AuthError::ExpiredOrRevoked => "token_expired_or_revoked",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::MalformedClaims
            | AuthError::ExpiredOrRevoked
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Authentication token is required"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::MalformedClaims => write!(f, "Invalid token claims"),
            AuthError::ExpiredOrRevoked => write!(f, "Token expired or revoked"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::Internal(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(cause) = &self {
            tracing::error!(error = %cause, "authentication failed internally");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(cause) => ApiError::internal(cause),
            other => ApiError::new(other.status_code(), other.to_string()),
        }
    }
}
