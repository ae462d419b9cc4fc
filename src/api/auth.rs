// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{Auth, AuthError},
    error::ApiError,
    models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    state::AppState,
    storage::{repository::normalize_email, DbError, StoredUser, TokenRepository, UserRepository},
};

pub const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request("Invalid email address"))
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, body = RegisterResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = normalize_email(&request.email);
    validate_email(&email)?;
    validate_password(&request.password)?;

    let users = UserRepository::new(&state.db);
    if users.email_exists(&email)? {
        return Err(ApiError::conflict("Email already registered"));
    }

    let hasher = state.passwords.clone();
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;

    let user = StoredUser {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        created_at: Utc::now(),
    };
    match users.create(&user) {
        Ok(()) => {}
        Err(DbError::AlreadyExists(_)) => {
            return Err(ApiError::conflict("Email already registered"))
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = UserRepository::new(&state.db).find_by_email(&request.email)?;

    // Unknown emails still pay for a scrypt verification.
    let hasher = state.passwords.clone();
    let password = request.password;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || match stored_hash {
        Some(phc) => hasher.verify(&password, &phc),
        None => hasher.verify_unknown(&password),
    })
    .await
    .map_err(ApiError::internal)?;

    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    let issued = state.tokens.issue(&user.id).map_err(ApiError::internal)?;
    TokenRepository::new(&state.db).record(
        &issued.token,
        &user.id,
        issued.issued_at,
        issued.expires_at,
    )?;

    tracing::info!(user_id = %user.id, jti = issued.jti.get(..8).unwrap_or_default(), "user logged in");
    Ok(Json(LoginResponse {
        token: issued.token,
        expires_in: state.tokens.lifetime().as_secs(),
    }))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing, invalid or revoked token")
    )
)]
pub async fn logout(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    TokenRepository::new(&state.db).revoke(&user.token)?;
    tracing::info!(user_id = %user.user_id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}
