// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (registration and lookup)
//! - Plants (CRUD, always scoped to the owning user)
//! - Schema creation and column upgrades

use crate::db::schema::{self, PLANT_COLUMNS};
use crate::error::AppError;
use crate::models::{PhotoSource, PhotoUpdate, Plant, PlantDraft, User};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

const MAX_CONNECTIONS: u32 = 5;

/// SQLite database client.
#[derive(Clone)]
pub struct PlantDb {
    pool: SqlitePool,
}

impl PlantDb {
    /// Open (creating if needed) the database file at `path`.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "Opened SQLite database");
        Ok(Self { pool })
    }

    /// Private in-memory database, for tests.
    ///
    /// Every pooled connection to `:memory:` would see its own empty
    /// database, so the pool is pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ─── Schema ──────────────────────────────────────────────────

    /// Create missing tables and bring older databases up to date.
    pub async fn migrate(&self) -> Result<(), AppError> {
        for statement in schema::CREATE_TABLES {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        let mut added = 0;
        for col in schema::ADDED_COLUMNS {
            if self.has_column(col.table, col.column).await? {
                continue;
            }
            let ddl = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                col.table, col.column, col.definition
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
            tracing::info!(table = col.table, column = col.column, "Added missing column");
            added += 1;
        }

        if added > 0 {
            let backfilled = sqlx::query(schema::BACKFILL_PHOTO_SOURCE)
                .execute(&self.pool)
                .await?
                .rows_affected();
            tracing::info!(rows = backfilled, "Backfilled photo_source for legacy uploads");
        }

        Ok(())
    }

    async fn has_column(&self, table: &str, column: &str) -> Result<bool, AppError> {
        let rows = sqlx::query("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .any(|row| row.get::<String, _>("name").eq_ignore_ascii_case(column)))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Insert a user, returning its id.
    ///
    /// Fails with `DuplicateUsername` if the name is taken in any letter case.
    pub async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        hashed_password: &str,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(
            "INSERT INTO Users (username, email, hashed_password) VALUES (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(email)
        .bind(hashed_password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, email, hashed_password FROM Users WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Look up a user by name, ignoring letter case.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, username, email, hashed_password FROM Users \
             WHERE username = ?1 COLLATE NOCASE",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Replace a user's password hash.
    pub async fn update_password(
        &self,
        user_id: i64,
        hashed_password: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE Users SET hashed_password = ?1 WHERE user_id = ?2")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ─── Plant Operations ────────────────────────────────────────

    /// Insert a plant for `user_id`, returning its id.
    pub async fn insert_plant(&self, user_id: i64, draft: &PlantDraft) -> Result<i64, AppError> {
        let photo = PhotoColumns::from_update(&draft.photo).unwrap_or_default();

        let done = sqlx::query(
            "INSERT INTO Plants \
             (user_id, name, room, added, winterval, photo, photo_path, photo_source, photo_mime) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(user_id)
        .bind(&draft.name)
        .bind(&draft.room)
        .bind(draft.added)
        .bind(i64::from(draft.winterval))
        .bind(photo.bytes)
        .bind(photo.path)
        .bind(photo.source)
        .bind(photo.mime)
        .execute(&self.pool)
        .await?;

        Ok(done.last_insert_rowid())
    }

    pub async fn get_plant(&self, user_id: i64, plant_id: i64) -> Result<Option<Plant>, AppError> {
        let sql = format!(
            "SELECT {} FROM Plants WHERE id_plant = ?1 AND user_id = ?2",
            PLANT_COLUMNS
        );
        let plant = sqlx::query_as::<_, Plant>(&sql)
            .bind(plant_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(plant)
    }

    /// All plants of a user, by name.
    pub async fn list_plants(&self, user_id: i64) -> Result<Vec<Plant>, AppError> {
        let sql = format!(
            "SELECT {} FROM Plants WHERE user_id = ?1 ORDER BY name COLLATE NOCASE, id_plant",
            PLANT_COLUMNS
        );
        let plants = sqlx::query_as::<_, Plant>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(plants)
    }

    /// Overwrite a plant's fields. Returns false if the user owns no such plant.
    pub async fn update_plant(
        &self,
        user_id: i64,
        plant_id: i64,
        draft: &PlantDraft,
    ) -> Result<bool, AppError> {
        let result = match PhotoColumns::from_update(&draft.photo) {
            None => {
                sqlx::query(
                    "UPDATE Plants SET name = ?1, room = ?2, added = ?3, winterval = ?4 \
                     WHERE id_plant = ?5 AND user_id = ?6",
                )
                .bind(&draft.name)
                .bind(&draft.room)
                .bind(draft.added)
                .bind(i64::from(draft.winterval))
                .bind(plant_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
            }
            Some(photo) => {
                sqlx::query(
                    "UPDATE Plants SET name = ?1, room = ?2, added = ?3, winterval = ?4, \
                     photo = ?5, photo_path = ?6, photo_source = ?7, photo_mime = ?8 \
                     WHERE id_plant = ?9 AND user_id = ?10",
                )
                .bind(&draft.name)
                .bind(&draft.room)
                .bind(draft.added)
                .bind(i64::from(draft.winterval))
                .bind(photo.bytes)
                .bind(photo.path)
                .bind(photo.source)
                .bind(photo.mime)
                .bind(plant_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// Record a watering. Returns false if the user owns no such plant.
    pub async fn water_plant(
        &self,
        user_id: i64,
        plant_id: i64,
        on: NaiveDate,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE Plants SET watered = ?1 WHERE id_plant = ?2 AND user_id = ?3")
                .bind(on)
                .bind(plant_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a plant. Returns false if the user owns no such plant.
    pub async fn delete_plant(&self, user_id: i64, plant_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM Plants WHERE id_plant = ?1 AND user_id = ?2")
            .bind(plant_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Uploaded photo bytes and their recorded MIME type.
    pub async fn get_photo(
        &self,
        user_id: i64,
        plant_id: i64,
    ) -> Result<Option<(Vec<u8>, Option<String>)>, AppError> {
        let row = sqlx::query(
            "SELECT photo, photo_mime FROM Plants \
             WHERE id_plant = ?1 AND user_id = ?2 AND photo_source = 'upload' \
             AND photo IS NOT NULL",
        )
        .bind(plant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.get("photo"), r.get("photo_mime"))))
    }
}

/// Values for the four photo columns, which always change together.
#[derive(Debug)]
struct PhotoColumns<'a> {
    bytes: Option<&'a [u8]>,
    path: Option<&'a str>,
    source: PhotoSource,
    mime: Option<&'a str>,
}

impl Default for PhotoColumns<'_> {
    fn default() -> Self {
        Self {
            bytes: None,
            path: None,
            source: PhotoSource::None,
            mime: None,
        }
    }
}

impl<'a> PhotoColumns<'a> {
    /// `None` means the photo columns are left as they are.
    fn from_update(update: &'a PhotoUpdate) -> Option<Self> {
        match update {
            PhotoUpdate::Keep => None,
            PhotoUpdate::Upload { bytes, mime } => Some(Self {
                bytes: Some(bytes.as_slice()),
                source: PhotoSource::Upload,
                mime: Some(mime.as_str()),
                ..Self::default()
            }),
            PhotoUpdate::Stock(stock) => Some(Self {
                path: Some(stock.path),
                source: PhotoSource::Stock,
                ..Self::default()
            }),
            PhotoUpdate::Remove => Some(Self::default()),
        }
    }
}
