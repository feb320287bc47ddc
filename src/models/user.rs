// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User account model.

use serde::Serialize;

/// Row of the `Users` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Primary key, also the session subject
    pub user_id: i64,
    /// Unique, compared case-insensitively
    pub username: String,
    /// Optional contact address
    pub email: Option<String>,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub hashed_password: String,
}
