// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

use super::files::{content_disposition, file_response};
use crate::{
    auth::Auth, error::ApiError, files::FileError, models::ShareLinkResponse, state::AppState,
};

#[utoipa::path(
    post,
    path = "/files/{file_id}/share",
    params(
        ("file_id" = String, Path, description = "Identifier of the file to share")
    ),
    tag = "Shares",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ShareLinkResponse),
        (status = 401, description = "Missing, invalid or revoked token"),
        (status = 404, description = "File not found")
    )
)]
pub async fn create_share(
    Auth(user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ShareLinkResponse>, ApiError> {
    let share = state.shares().create_share(&file_id, &user.user_id)?;
    Ok(Json(ShareLinkResponse {
        share_url: format!("/share/{}", share.token),
        token: share.token,
        expires_at: share.expires_at,
    }))
}

/// Serve a shared file. No authentication.
#[utoipa::path(
    get,
    path = "/share/{token}",
    params(
        ("token" = String, Path, description = "Share token")
    ),
    tag = "Shares",
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown share link"),
        (status = 410, description = "Share link expired")
    )
)]
pub async fn get_shared_file(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let resolution = state.shares().resolve_share(&token)?;

    let bytes = match state.files().read_blob(&resolution.storage_path) {
        Ok(bytes) => bytes,
        Err(FileError::NotFound) => {
            tracing::warn!(path = %resolution.storage_path, "shared file missing from blob store");
            return Err(ApiError::not_found("Invalid share link"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(file_response(
        bytes,
        &resolution.mime_type,
        content_disposition("inline", &resolution.name),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::files::NewUpload;
    use crate::storage::{ShareRepository, StoredShare};
    use crate::testutil::test_state;
    use axum::body::to_bytes;
    use axum::http::{header::CONTENT_DISPOSITION, StatusCode};
    use chrono::Utc;

    fn identity(user_id: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user_id.to_string(),
            token_id: "jti".to_string(),
            expires_at: Utc::now(),
            token: "t".to_string(),
        })
    }

    fn seed(state: &AppState) -> String {
        state
            .files()
            .create_file(
                "alice",
                NewUpload {
                    original_name: "photo.png".to_string(),
                    mime_type: Some("image/png".to_string()),
                    bytes: vec![1, 2, 3],
                },
            )
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn share_then_fetch_inline() {
        let (state, _dir) = test_state();
        let file_id = seed(&state);

        let Json(link) = create_share(identity("alice"), Path(file_id), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(link.share_url, format!("/share/{}", link.token));

        let response = get_shared_file(Path(link.token.clone()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("inline;"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn non_owner_cannot_share() {
        let (state, _dir) = test_state();
        let file_id = seed(&state);
        let err = create_share(identity("mallory"), Path(file_id), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn expired_is_gone_and_unknown_is_not_found() {
        let (state, _dir) = test_state();
        let file_id = seed(&state);
        let now = Utc::now();
        ShareRepository::new(&state.db)
            .insert(&StoredShare {
                token: "expired-token".to_string(),
                file_id,
                created_at: now - chrono::Duration::days(8),
                expires_at: now - chrono::Duration::days(1),
            })
            .unwrap();

        let gone = get_shared_file(Path("expired-token".to_string()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(gone.status, StatusCode::GONE);

        let missing = get_shared_file(Path("unknown".to_string()), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }
}
