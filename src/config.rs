// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A single `SECRET_KEY` is expanded with HKDF into separate keys for
//! session tokens and CSRF tokens.

use hkdf::Hkdf;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::env;
use std::path::PathBuf;

const SESSION_KEY_INFO: &[u8] = b"plant-tracker session v1";
const CSRF_KEY_INFO: &[u8] = b"plant-tracker csrf v1";
const DERIVED_KEY_LEN: usize = 32;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file
    pub database_file: PathBuf,
    /// Directory holding the stylesheet and stock images
    pub static_dir: PathBuf,
    /// Server port
    pub port: u16,
    /// Mark cookies `Secure` (set behind HTTPS)
    pub secure_cookies: bool,
    /// HMAC key for session JWTs
    pub session_key: Vec<u8>,
    /// HMAC key for CSRF tokens
    pub csrf_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret = match env::var("SECRET_KEY") {
            Ok(key) if !key.trim().is_empty() => key.trim().as_bytes().to_vec(),
            _ => {
                tracing::warn!(
                    "SECRET_KEY not set, using a random key; sessions will not survive a restart"
                );
                random_secret()?
            }
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        let secure_cookies = match env::var("COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("COOKIE_SECURE", raw))?,
            Err(_) => false,
        };

        Self::with_secret(
            &secret,
            env::var("DATABASE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("instance/database.db")),
            env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
            port,
            secure_cookies,
        )
    }

    /// Build a config, deriving the session and CSRF keys from `secret`.
    pub fn with_secret(
        secret: &[u8],
        database_file: PathBuf,
        static_dir: PathBuf,
        port: u16,
        secure_cookies: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            database_file,
            static_dir,
            port,
            secure_cookies,
            session_key: derive_key(secret, SESSION_KEY_INFO)?,
            csrf_key: derive_key(secret, CSRF_KEY_INFO)?,
        })
    }

    /// Config for tests: fixed secret, in-memory database path, local static dir.
    pub fn test_default() -> Self {
        Self::with_secret(
            b"test_secret_key_32_bytes_minimum!",
            PathBuf::from(":memory:"),
            PathBuf::from("static"),
            8080,
            false,
        )
        .expect("HKDF expand with a 32-byte output cannot fail")
    }
}

fn derive_key(secret: &[u8], info: &[u8]) -> Result<Vec<u8>, ConfigError> {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut okm = vec![0u8; DERIVED_KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| ConfigError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

fn random_secret() -> Result<Vec<u8>, ConfigError> {
    let mut secret = vec![0u8; DERIVED_KEY_LEN];
    SystemRandom::new()
        .fill(&mut secret)
        .map_err(|_| ConfigError::KeyDerivation("system RNG unavailable".to_string()))?;
    Ok(secret)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}
