// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::MeResponse,
    state::AppState,
    storage::UserRepository,
};

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = MeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "User no longer exists"),
    )
)]
pub async fn me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, ApiError> {
    let stored = UserRepository::new(&state.db)
        .get(&user.user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(MeResponse {
        user_id: stored.id,
        email: stored.email,
        created_at: stored.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::storage::StoredUser;
    use crate::testutil::test_state;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn identity(user_id: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user_id.to_string(),
            token_id: "jti".to_string(),
            expires_at: Utc::now(),
            token: "t".to_string(),
        })
    }

    #[tokio::test]
    async fn me_returns_stored_profile() {
        let (state, _dir) = test_state();
        let created_at = Utc::now();
        UserRepository::new(&state.db)
            .create(&StoredUser {
                id: "u1".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "$scrypt$x".to_string(),
                created_at,
            })
            .unwrap();

        let Json(profile) = me(identity("u1"), State(state.clone())).await.unwrap();
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.created_at, created_at);
    }

    #[tokio::test]
    async fn me_for_unknown_user_is_not_found() {
        let (state, _dir) = test_state();
        let err = me(identity("ghost"), State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
