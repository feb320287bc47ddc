// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account registration and login.

use crate::db::PlantDb;
use crate::error::AppError;
use crate::models::User;
use crate::services::password;
use validator::{Validate, ValidationErrors};

/// Registration form values.
#[derive(Debug, Clone, Default, Validate)]
pub struct Registration {
    #[validate(length(max = 64, message = "Username must be at most 64 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Order in which field errors are reported; only the first is shown.
const FIELD_PRIORITY: &[&str] = &["confirm_password", "username", "email"];

/// Service for creating and authenticating users.
#[derive(Clone)]
pub struct AccountService {
    db: PlantDb,
}

impl AccountService {
    pub fn new(db: PlantDb) -> Self {
        Self { db }
    }

    /// Create a user. The username is trimmed and an empty email is treated
    /// as absent.
    pub async fn register(&self, mut reg: Registration) -> Result<User, AppError> {
        reg.username = reg.username.trim().to_string();
        reg.email = reg
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if reg.username.is_empty() || reg.password.is_empty() {
            return Err(AppError::Validation(
                "Username and password required".to_string(),
            ));
        }
        reg.validate()
            .map_err(|e| AppError::Validation(first_message(&e)))?;

        let hashed_password = hash_blocking(reg.password.clone()).await?;
        let user_id = self
            .db
            .create_user(&reg.username, reg.email.as_deref(), &hashed_password)
            .await?;

        tracing::info!(user_id, username = %reg.username, "Registered new user");

        Ok(User {
            user_id,
            username: reg.username,
            email: reg.email,
            hashed_password,
        })
    }

    /// Check credentials. Unknown users and wrong passwords fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let Some(user) = self.db.get_user_by_username(username).await? else {
            tracing::warn!(username, "Login attempt for unknown user");
            return Err(AppError::InvalidCredentials);
        };

        let hashed = user.hashed_password.clone();
        let candidate = password.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            password::verify_password(&candidate, &hashed)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check panicked: {}", e)))?;

        match verified {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(user_id = user.user_id, "Login failed: wrong password");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => {
                tracing::warn!(
                    user_id = user.user_id,
                    error = %e,
                    "Unusable stored password hash"
                );
                return Err(AppError::InvalidCredentials);
            }
        }

        let user = if password::needs_rehash(&user.hashed_password) {
            self.upgrade_hash(user, password).await
        } else {
            user
        };

        tracing::info!(user_id = user.user_id, "User logged in");
        Ok(user)
    }

    /// Replace a legacy hash with Argon2 after a successful login. Failure
    /// leaves the old hash in place and does not fail the login.
    async fn upgrade_hash(&self, mut user: User, password: &str) -> User {
        let upgraded = match hash_blocking(password.to_string()).await {
            Ok(hashed) => self
                .db
                .update_password(user.user_id, &hashed)
                .await
                .map(|()| hashed),
            Err(e) => Err(e),
        };
        match upgraded {
            Ok(hashed) => {
                tracing::info!(user_id = user.user_id, "Upgraded legacy password hash");
                user.hashed_password = hashed;
            }
            Err(e) => {
                tracing::warn!(
                    user_id = user.user_id,
                    error = %e,
                    "Failed to upgrade password hash"
                );
            }
        }
        user
    }
}

async fn hash_blocking(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing panicked: {}", e)))??;
    Ok(hashed)
}

fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    FIELD_PRIORITY
        .iter()
        .filter_map(|name| fields.get(*name))
        .chain(fields.values())
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid registration".to_string())
}
