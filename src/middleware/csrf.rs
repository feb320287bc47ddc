// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSRF tokens for HTML forms.
//!
//! A random nonce lives in the `plant_csrf` cookie. Forms carry
//! `hex(HMAC-SHA256(csrf_key, nonce))` in a hidden `csrf_token` field, and
//! every POST handler checks the pair before doing anything else.

use crate::error::AppError;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use subtle::ConstantTimeEq;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub const CSRF_COOKIE: &str = "plant_csrf";
pub const CSRF_FIELD: &str = "csrf_token";

const NONCE_LEN: usize = 32;

/// Compute the form token for a cookie nonce.
pub fn token_for(key: &[u8], nonce: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(nonce.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Return the jar (with a nonce cookie added if there was none) and the
/// token to embed in the form.
pub fn issue(jar: CookieJar, key: &[u8], secure: bool) -> Result<(CookieJar, String), AppError> {
    let existing = jar
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| is_valid_nonce(v));

    let (jar, nonce) = match existing {
        Some(nonce) => (jar, nonce),
        None => {
            let nonce = new_nonce()?;
            let cookie = Cookie::build((CSRF_COOKIE, nonce.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(secure)
                .build();
            (jar.add(cookie), nonce)
        }
    };

    let token = token_for(key, &nonce)?;
    Ok((jar, token))
}

/// Check a submitted form token against the cookie nonce.
pub fn verify(jar: &CookieJar, key: &[u8], submitted: &str) -> Result<(), AppError> {
    let nonce = jar
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| is_valid_nonce(v))
        .ok_or(AppError::CsrfMismatch)?;

    let expected = token_for(key, &nonce)?;
    if bool::from(expected.as_bytes().ct_eq(submitted.trim().as_bytes())) {
        Ok(())
    } else {
        Err(AppError::CsrfMismatch)
    }
}

fn new_nonce() -> Result<String, AppError> {
    let mut bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;
    Ok(hex::encode(bytes))
}

fn is_valid_nonce(value: &str) -> bool {
    value.len() == NONCE_LEN * 2 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
