// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod plants;

use crate::middleware::auth::{require_auth, session_user_id};
use crate::AppState;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Html;
use axum::{middleware, routing::get, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Request body cap. Above the photo limit so that oversized photos reach
/// the handler and are reported on the form.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Landing page.
async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Html<String> {
    let signed_in = session_user_id(&jar, &state.config.session_key).is_some();
    crate::views::index_page(signed_in)
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/healthz", get(health_check))
        .merge(auth::routes())
        .nest_service("/static", ServeDir::new(&state.config.static_dir));

    // Protected routes (session required, otherwise redirect to /login)
    let protected_routes =
        plants::routes().route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
