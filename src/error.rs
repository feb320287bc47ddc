// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent HTML responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or missing CSRF token")]
    CsrfMismatch,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unsupported image format (use JPEG, PNG, WebP or GIF)")]
    UnsupportedImage,

    #[error("Image too large (max 2 MB)")]
    ImageTooLarge,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors caused by form input, which handlers show inline
    /// next to the form instead of failing the request.
    pub fn is_form_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::DuplicateUsername
                | AppError::InvalidCredentials
                | AppError::UnsupportedImage
                | AppError::ImageTooLarge
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => return Redirect::to("/login").into_response(),
            AppError::CsrfMismatch => {
                tracing::warn!("Rejected request with invalid CSRF token");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(_)
            | AppError::DuplicateUsername
            | AppError::InvalidCredentials
            | AppError::UnsupportedImage
            | AppError::ImageTooLarge => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };

        (status, crate::views::error_page(status, &message)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
