// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use plant_tracker::config::Config;
use plant_tracker::db::PlantDb;
use plant_tracker::middleware::csrf::{self, CSRF_COOKIE};
use plant_tracker::routes::create_router;
use plant_tracker::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Fixed CSRF nonce so tests can compute the matching form token.
#[allow(dead_code)]
pub const TEST_NONCE: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

const BOUNDARY: &str = "----plant-tracker-test-boundary";

/// Create a test app backed by a fresh in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = PlantDb::in_memory()
        .await
        .expect("Failed to open in-memory database");
    db.migrate().await.expect("Failed to create schema");

    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Form token matching [`TEST_NONCE`].
#[allow(dead_code)]
pub fn csrf_token(state: &AppState) -> String {
    csrf::token_for(&state.config.csrf_key, TEST_NONCE).unwrap()
}

/// `Cookie` header with the CSRF nonce and, optionally, a session.
#[allow(dead_code)]
pub fn cookies(session: Option<&str>) -> String {
    match session {
        Some(session) => format!("{CSRF_COOKIE}={TEST_NONCE}; {session}"),
        None => format!("{CSRF_COOKIE}={TEST_NONCE}"),
    }
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// URL-encoded POST. Values must not need escaping.
#[allow(dead_code)]
pub fn post_form(uri: &str, cookie: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// multipart/form-data POST with text fields and an optional `photo` file.
#[allow(dead_code)]
pub fn post_multipart(
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    photo: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// `name=value` of the first Set-Cookie header for `name`.
#[allow(dead_code)]
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing Location header")
        .to_str()
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Register a user through the HTTP form and return the session cookie
/// (`plant_session=...`).
#[allow(dead_code)]
pub async fn register(app: &Router, state: &AppState, username: &str, password: &str) -> String {
    let token = csrf_token(state);
    let response = app
        .clone()
        .oneshot(post_form(
            "/register",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", username),
                ("password", password),
                ("confirm_password", password),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 303, "registration of {username} failed");
    set_cookie(&response, "plant_session").expect("registration should set a session")
}

/// Small PNG for upload tests.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([40u8, 120, 60])));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
