// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate for protected routes.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/files", get(list_files))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));
//! ```
//!
//! A token is accepted only if it verifies cryptographically *and* a live
//! registry row backs it. Callers never see a signature-only result.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{TimeZone, Utc};

use super::extractor::extract_token;
use super::tokens::{TokenError, TokenIssuer};
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;
use crate::storage::{Database, TokenRepository};

/// Composes token verification with the registry liveness check.
pub struct Authenticator<'a> {
    issuer: &'a TokenIssuer,
    db: &'a Database,
}

impl<'a> Authenticator<'a> {
    pub fn new(issuer: &'a TokenIssuer, db: &'a Database) -> Self {
        Self { issuer, db }
    }

    /// Resolve a candidate token to an identity.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.issuer.verify(token).map_err(|e| match e {
            TokenError::Expired => AuthError::ExpiredOrRevoked,
            _ => AuthError::InvalidToken,
        })?;

        let user_id = claims.subject().ok_or(AuthError::MalformedClaims)?;

        let live = TokenRepository::new(self.db)
            .is_live(token, user_id, Utc::now())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !live {
            tracing::debug!(jti = %claims.jti_prefix(), "token not live in registry");
            return Err(AuthError::ExpiredOrRevoked);
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AuthError::MalformedClaims)?;

        Ok(AuthenticatedUser {
            user_id: user_id.to_string(),
            token_id: claims.jti.clone(),
            expires_at,
            token: token.to_string(),
        })
    }
}

/// Gate middleware: reject, or bind the identity and run the handler.
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut request, candidate) =
        match extract_token(request, state.config.max_upload_bytes).await {
            Ok(found) => found,
            Err(rejection) => return rejection,
        };

    let Some(candidate) = candidate else {
        return AuthError::MissingToken.into_response();
    };

    match state.authenticator().authenticate(&candidate.token) {
        Ok(user) => {
            tracing::debug!(user_id = %user.user_id, source = ?candidate.source, "request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    fn login(state: &AppState, user_id: &str) -> String {
        let issued = state.tokens.issue(user_id).unwrap();
        TokenRepository::new(&state.db)
            .record(&issued.token, user_id, issued.issued_at, issued.expires_at)
            .unwrap();
        issued.token
    }

    #[test]
    fn recorded_token_authenticates() {
        let (state, _dir) = test_state();
        let token = login(&state, "user_1");

        let user = state.authenticator().authenticate(&token).unwrap();
        assert_eq!(user.user_id, "user_1");
        assert_eq!(user.token, token);
    }

    #[test]
    fn unrecorded_token_is_rejected() {
        let (state, _dir) = test_state();
        let issued = state.tokens.issue("user_1").unwrap();
        assert!(matches!(
            state.authenticator().authenticate(&issued.token),
            Err(AuthError::ExpiredOrRevoked)
        ));
    }

    #[test]
    fn expired_registry_row_rejects_valid_signature() {
        let (state, _dir) = test_state();
        let issued = state.tokens.issue("user_1").unwrap();
        let now = Utc::now();
        TokenRepository::new(&state.db)
            .record(
                &issued.token,
                "user_1",
                now - chrono::Duration::hours(2),
                now - chrono::Duration::hours(1),
            )
            .unwrap();

        assert!(state.tokens.verify(&issued.token).is_ok());
        assert!(matches!(
            state.authenticator().authenticate(&issued.token),
            Err(AuthError::ExpiredOrRevoked)
        ));
    }

    #[test]
    fn revoked_token_is_rejected() {
        let (state, _dir) = test_state();
        let token = login(&state, "user_1");
        TokenRepository::new(&state.db).revoke(&token).unwrap();
        assert!(matches!(
            state.authenticator().authenticate(&token),
            Err(AuthError::ExpiredOrRevoked)
        ));
    }

    #[test]
    fn missing_subject_is_malformed_claims() {
        let (state, _dir) = test_state();
        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"jti": "abc", "iat": now, "exp": now + 60}),
            &EncodingKey::from_secret(&state.config.jwt_secret),
        )
        .unwrap();
        assert!(matches!(
            state.authenticator().authenticate(&token),
            Err(AuthError::MalformedClaims)
        ));
    }

    #[test]
    fn garbage_is_invalid_token() {
        let (state, _dir) = test_state();
        assert!(matches!(
            state.authenticator().authenticate("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }
}
