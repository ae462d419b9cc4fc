// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    files::NewUpload,
    models::{FileSummary, UploadResponse, UploadedFile},
    state::AppState,
};

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

const FALLBACK_FILENAME: &str = "upload";

/// `Content-Disposition` value with a header-safe filename.
pub(crate) fn content_disposition(kind: &str, filename: &str) -> HeaderValue {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    HeaderValue::from_str(&format!("{kind}; filename=\"{safe}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Binary response with the stored MIME type.
pub(crate) fn file_response(bytes: Vec<u8>, mime_type: &str, disposition: HeaderValue) -> Response {
    let content_type = HeaderValue::from_str(mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    (
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        bytes,
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Files",
    security(("bearer" = [])),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 201, body = UploadResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 401, description = "Missing, invalid or revoked token"),
        (status = 413, description = "Upload too large")
    )
)]
pub async fn upload_file(
    Auth(user): Auth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        upload = Some(NewUpload {
            original_name,
            mime_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let stored = state.files().create_file(&user.user_id, upload)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            file: UploadedFile::from(&stored),
            message: "File uploaded successfully".to_string(),
            url: stored.url,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Files",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's files, newest first", body = [FileSummary]),
        (status = 401, description = "Missing, invalid or revoked token")
    )
)]
pub async fn list_files(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<FileSummary>>, ApiError> {
    let files = state.files().list_by_owner(&user.user_id)?;
    Ok(Json(files.into_iter().map(FileSummary::from).collect()))
}

#[utoipa::path(
    get,
    path = "/files/{file_id}/download",
    params(
        ("file_id" = String, Path, description = "Identifier of the file to download")
    ),
    tag = "Files",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 401, description = "Missing, invalid or revoked token"),
        (status = 404, description = "File not found")
    )
)]
pub async fn download_file(
    Auth(user): Auth,
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let files = state.files();
    let file = files.get_for_owner(&file_id, &user.user_id)?;
    let bytes = files.read_blob(&file.storage_path)?;

    Ok(file_response(
        bytes,
        &file.mime_type,
        content_disposition("attachment", &file.name),
    ))
}
