// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login, logout and session cookie tests.

use axum::http::{header, StatusCode};
use tower::ServiceExt;

mod common;

use common::{body_string, cookies, csrf_token, get, location, post_form, set_cookie};

#[tokio::test]
async fn test_protected_routes_redirect_without_session() {
    let (app, _) = common::create_test_app().await;

    for uri in ["/album", "/add_plant", "/plant/1/edit", "/plant/1/photo"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_garbage_session_cookie_redirects_to_login() {
    let (app, _) = common::create_test_app().await;

    let response = app
        .oneshot(get("/album", Some("plant_session=not.a.jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_session_for_unknown_user_redirects_to_login() {
    let (app, state) = common::create_test_app().await;

    let jwt = plant_tracker::middleware::auth::create_jwt(999, &state.config.session_key).unwrap();
    let response = app
        .oneshot(get("/album", Some(&format!("plant_session={jwt}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_page_issues_csrf_cookie() {
    let (app, _) = common::create_test_app().await;

    let response = app.oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let raw = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|v| v.starts_with("plant_csrf="))
        .expect("login page should set the CSRF cookie");
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Lax"));

    let body = body_string(response).await;
    assert!(body.contains(r#"name="csrf_token""#));
    assert!(body.contains(r#"action="/register""#));
}

#[tokio::test]
async fn test_register_starts_session_and_album_loads() {
    let (app, state) = common::create_test_app().await;

    let token = csrf_token(&state);
    let response = app
        .clone()
        .oneshot(post_form(
            "/register",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", "alice"),
                ("password", "hunter22"),
                ("confirm_password", "hunter22"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/album");

    let raw = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|v| v.starts_with("plant_session="))
        .unwrap();
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("Path=/"));
    assert!(raw.contains("Max-Age=2592000"));
    assert!(!raw.contains("Secure"));

    let session = set_cookie(&response, "plant_session").unwrap();
    let response = app.oneshot(get("/album", Some(&session))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("No plants yet"));
}

#[tokio::test]
async fn test_duplicate_username_is_rejected_case_insensitively() {
    let (app, state) = common::create_test_app().await;
    common::register(&app, &state, "alice", "hunter22").await;

    let token = csrf_token(&state);
    let response = app
        .oneshot(post_form(
            "/register",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", "Alice"),
                ("password", "different"),
                ("confirm_password", "different"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(set_cookie(&response, "plant_session").is_none());
    assert!(body_string(response).await.contains("Username already exists"));
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let (app, state) = common::create_test_app().await;

    let token = csrf_token(&state);
    let response = app
        .oneshot(post_form(
            "/register",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", "alice"),
                ("password", "hunter22"),
                ("confirm_password", "hunter23"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response).await.contains("Passwords do not match"));
}

#[tokio::test]
async fn test_login_with_wrong_password_and_unknown_user() {
    let (app, state) = common::create_test_app().await;
    common::register(&app, &state, "alice", "hunter22").await;
    let token = csrf_token(&state);

    for (username, password) in [("alice", "wrong"), ("nobody", "hunter22")] {
        let response = app
            .clone()
            .oneshot(post_form(
                "/login",
                &cookies(None),
                &[
                    ("csrf_token", &token),
                    ("username", username),
                    ("password", password),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(set_cookie(&response, "plant_session").is_none());
        assert!(body_string(response)
            .await
            .contains("Invalid username or password"));
    }
}

#[tokio::test]
async fn test_login_with_legacy_password_hashes() {
    let (app, state) = common::create_test_app().await;
    state
        .db
        .create_user(
            "old",
            None,
            "pbkdf2:sha256:1000$abcdEFGH12345678$\
             23020f6dff74af118c3b2dc604bb06caab6760b10a752c60206a7d790c9e94a5",
        )
        .await
        .unwrap();
    state
        .db
        .create_user("older", None, "pbkdf2:sha256:1000$abcd$0123456789abcdef")
        .await
        .unwrap();
    let token = csrf_token(&state);

    // Legacy hashes that do not match the submitted password
    for (username, password) in [("old", "wrong"), ("older", "whatever")] {
        let response = app
            .clone()
            .oneshot(post_form(
                "/login",
                &cookies(None),
                &[
                    ("csrf_token", &token),
                    ("username", username),
                    ("password", password),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{username}");
        assert!(body_string(response)
            .await
            .contains("Invalid username or password"));
    }

    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", "old"),
                ("password", "hunter22"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/album");

    let user = state.db.get_user_by_username("old").await.unwrap().unwrap();
    assert!(user.hashed_password.starts_with("$argon2"));
}

#[tokio::test]
async fn test_login_with_unparseable_stored_hash() {
    let (app, state) = common::create_test_app().await;
    state
        .db
        .create_user("broken", None, "not-a-hash")
        .await
        .unwrap();

    let token = csrf_token(&state);
    let response = app
        .oneshot(post_form(
            "/login",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", "broken"),
                ("password", "anything"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_sets_session_that_survives_requests() {
    let (app, state) = common::create_test_app().await;
    common::register(&app, &state, "alice", "hunter22").await;

    let token = csrf_token(&state);
    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            &cookies(None),
            &[
                ("csrf_token", &token),
                ("username", "alice"),
                ("password", "hunter22"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/album");
    let session = set_cookie(&response, "plant_session").unwrap();

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get("/album", Some(&session)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let (app, state) = common::create_test_app().await;
    let session = common::register(&app, &state, "alice", "hunter22").await;

    let response = app.oneshot(get("/logout", Some(&session))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let raw = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .find(|v| v.starts_with("plant_session="))
        .expect("logout should clear the session cookie");
    assert!(raw.contains("Max-Age=0"));
    assert!(raw.contains("Path=/"));
}

#[tokio::test]
async fn test_login_without_csrf_token_is_rejected() {
    let (app, state) = common::create_test_app().await;
    common::register(&app, &state, "alice", "hunter22").await;

    // Token present but no CSRF cookie
    let token = csrf_token(&state);
    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            "",
            &[
                ("csrf_token", &token),
                ("username", "alice"),
                ("password", "hunter22"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&response, "plant_session").is_none());

    // Cookie present but token for a different nonce
    let other = plant_tracker::middleware::csrf::token_for(
        &state.config.csrf_key,
        "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
    )
    .unwrap();
    let response = app
        .oneshot(post_form(
            "/login",
            &cookies(None),
            &[
                ("csrf_token", &other),
                ("username", "alice"),
                ("password", "hunter22"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_index_and_healthz() {
    let (app, state) = common::create_test_app().await;

    let response = app.clone().oneshot(get("/healthz", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json, serde_json::json!({ "ok": true }));

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains(r#"href="/register""#));

    let session = common::register(&app, &state, "alice", "hunter22").await;
    let response = app.oneshot(get("/", Some(&session))).await.unwrap();
    assert!(body_string(response).await.contains("Go to my plants"));
}
