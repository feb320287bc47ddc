// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, registration and logout routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_cookie, session_removal_cookie};
use crate::middleware::csrf;
use crate::services::Registration;
use crate::views;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/register", get(login_form).post(register))
        .route("/logout", get(logout))
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    csrf_token: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    csrf_token: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}

/// Show the login and registration forms.
async fn login_form(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    render_login(&state, jar, None, StatusCode::OK)
}

/// Check credentials and start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    csrf::verify(&jar, &state.config.csrf_key, &form.csrf_token)?;

    match state.accounts.login(&form.username, &form.password).await {
        Ok(user) => start_session(&state, jar, user.user_id),
        Err(e) if e.is_form_error() => {
            render_login(&state, jar, Some(&e.to_string()), StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => Err(e),
    }
}

/// Create an account and start a session for it.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    csrf::verify(&jar, &state.config.csrf_key, &form.csrf_token)?;

    let registration = Registration {
        username: form.username,
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match state.accounts.register(registration).await {
        Ok(user) => start_session(&state, jar, user.user_id),
        Err(e) if e.is_form_error() => {
            render_login(&state, jar, Some(&e.to_string()), StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => Err(e),
    }
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(session_removal_cookie()), Redirect::to("/login"))
}

fn start_session(state: &AppState, jar: CookieJar, user_id: i64) -> Result<Response> {
    let jwt = create_jwt(user_id, &state.config.session_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let jar = jar.add(session_cookie(jwt, state.config.secure_cookies));
    Ok((jar, Redirect::to("/album")).into_response())
}

fn render_login(
    state: &AppState,
    jar: CookieJar,
    error: Option<&str>,
    status: StatusCode,
) -> Result<Response> {
    let (jar, token) = csrf::issue(jar, &state.config.csrf_key, state.config.secure_cookies)?;
    Ok((status, jar, views::login_page(&token, error)).into_response())
}
