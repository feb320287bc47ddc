// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication middleware.

use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "plant_session";

const SESSION_DAYS: i64 = 30;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Middleware that requires a valid session, redirecting to the login page
/// otherwise.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(user_id) = session_user_id(&jar, &state.config.session_key) else {
        return Redirect::to("/login").into_response();
    };

    // The token may outlive its user, e.g. after the database is reset
    match state.db.get_user(user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::debug!(user_id, "Session names unknown user");
            return Redirect::to("/login").into_response();
        }
        Err(e) => return e.into_response(),
    }

    request.extensions_mut().insert(AuthUser { user_id });
    next.run(request).await
}

/// User id of a valid session cookie, if any.
pub fn session_user_id(jar: &CookieJar, signing_key: &[u8]) -> Option<i64> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();

    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(&token, &key, &validation).ok()?;
    token_data.claims.sub.parse().ok()
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: i64, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + (SESSION_DAYS as usize) * 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Cookie carrying a fresh session token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}

/// Cookie that, when removed from a jar, clears the session.
pub fn session_removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
