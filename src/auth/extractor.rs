// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token extraction and the `Auth` extractor.
//!
//! A candidate token is looked up in strict precedence:
//!
//! 1. `Authorization: Bearer <token>` (scheme is case-insensitive)
//! 2. query parameter `token`
//! 3. urlencoded form field `token`
//! 4. multipart field `token`
//!
//! The first non-empty value wins. The body is only buffered when the first
//! two sources come up empty and the content type is a form or multipart;
//! it is handed back to the handler unchanged.
//!
//! Handlers use the `Auth` extractor to read the identity bound by
//! [`super::middleware::require_auth`]:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderMap, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use super::{AuthError, AuthenticatedUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Name of the token field in query strings and bodies.
pub const TOKEN_FIELD: &str = "token";

const BEARER_PREFIX: &str = "bearer ";

/// Where a candidate token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Query,
    Form,
    Multipart,
}

#[derive(Clone, PartialEq, Eq)]
pub struct TokenCandidate {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for TokenCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCandidate")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    non_empty(&value[BEARER_PREFIX.len()..])
}

/// Token from the `token` query parameter.
pub fn query_token(uri: &Uri) -> Option<String> {
    field_from_urlencoded(uri.query()?.as_bytes())
}

/// Token from a urlencoded form body.
pub fn form_token(body: &[u8]) -> Option<String> {
    field_from_urlencoded(body)
}

/// Token from a multipart body. Parse failures count as "no token".
pub async fn multipart_token(body: Bytes, boundary: String) -> Option<String> {
    let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(TOKEN_FIELD) {
            return field.text().await.ok().and_then(|text| non_empty(&text));
        }
    }
    None
}

/// Find a candidate token, buffering the body only when it is needed.
///
/// Returns the request (with its body restored) and the candidate, if any.
/// A body larger than `body_limit` is rejected with 413.
pub async fn extract_token(
    request: Request,
    body_limit: usize,
) -> Result<(Request, Option<TokenCandidate>), Response> {
    if let Some(token) = bearer_token(request.headers()) {
        return Ok((request, Some(candidate(token, TokenSource::Header))));
    }
    if let Some(token) = query_token(request.uri()) {
        return Ok((request, Some(candidate(token, TokenSource::Query))));
    }

    let body_kind = match BodyKind::of(request.headers()) {
        Some(kind) => kind,
        None => return Ok((request, None)),
    };

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, body_limit).await.map_err(|_| {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
    })?;

    let found = match body_kind {
        BodyKind::Form => form_token(&bytes).map(|t| candidate(t, TokenSource::Form)),
        BodyKind::Multipart(boundary) => multipart_token(bytes.clone(), boundary)
            .await
            .map(|t| candidate(t, TokenSource::Multipart)),
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), found))
}

enum BodyKind {
    Form,
    Multipart(String),
}

impl BodyKind {
    fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = content_type.split(';').next()?.trim();
        if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(BodyKind::Form)
        } else if essence.eq_ignore_ascii_case("multipart/form-data") {
            multer::parse_boundary(content_type).ok().map(BodyKind::Multipart)
        } else {
            None
        }
    }
}

fn candidate(token: String, source: TokenSource) -> TokenCandidate {
    TokenCandidate { token, source }
}

fn field_from_urlencoded(input: &[u8]) -> Option<String> {
    form_urlencoded::parse(input)
        .filter(|(key, _)| key == TOKEN_FIELD)
        .find_map(|(_, value)| non_empty(&value))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Extractor for authenticated users.
///
/// The identity is bound by the gate middleware on protected routes. Used on
/// a route without the gate, it rejects with `MissingToken`.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_files(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<FileSummary>>, ApiError> {
///     // user.user_id contains the authenticated user's ID
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::MissingToken)
    }
}
