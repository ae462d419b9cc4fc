// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    models::{
        FileSummary, LoginRequest, LoginResponse, MeResponse, RegisterRequest, RegisterResponse,
        ShareLinkResponse, UploadResponse, UploadedFile,
    },
    state::AppState,
};

pub mod auth;
pub mod files;
pub mod health;
pub mod shares;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(users::me))
        .route("/upload", post(files::upload_file))
        .route("/files", get(files::list_files))
        .route("/files/{file_id}/download", get(files::download_file))
        .route("/files/{file_id}/share", post(shares::create_share))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/share/{token}", get(shares::get_shared_file))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let body_limit = state.config.max_upload_bytes;
    let timeout = state.config.request_timeout;

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::logout,
        users::me,
        files::upload_file,
        files::list_files,
        files::download_file,
        shares::create_share,
        shares::get_shared_file,
        health::health,
        health::ready
    ),
    components(
        schemas(
            RegisterRequest,
            RegisterResponse,
            LoginRequest,
            LoginResponse,
            MeResponse,
            UploadedFile,
            UploadResponse,
            FileSummary,
            ShareLinkResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::ReadyChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and logout"),
        (name = "Users", description = "Current user"),
        (name = "Files", description = "Upload, list and download"),
        (name = "Shares", description = "Time-limited public share links"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;
