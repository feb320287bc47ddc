// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plant CRUD and watering, always scoped to the signed-in user.

use crate::db::PlantDb;
use crate::error::AppError;
use crate::models::{PhotoUpdate, Plant, PlantCard, PlantDraft};
use crate::services::photo::{self, StockImage};
use crate::services::schedule;
use crate::time_utils;
use chrono::NaiveDate;

/// Raw values from an add or edit form, before validation.
#[derive(Debug, Clone, Default)]
pub struct PlantInput {
    pub name: String,
    pub room: String,
    /// `YYYY-MM-DD`; empty means today
    pub added: String,
    pub winterval: String,
    /// Contents of the file input, if a file was chosen
    pub upload: Option<Vec<u8>>,
    /// Selected stock image key; empty for none
    pub stock_key: String,
    /// Edit only: drop the current photo
    pub remove_photo: bool,
}

/// Service for the plant album.
#[derive(Clone)]
pub struct PlantService {
    db: PlantDb,
}

impl PlantService {
    pub fn new(db: PlantDb) -> Self {
        Self { db }
    }

    /// Validate form input into a draft.
    ///
    /// Photo precedence: a non-empty upload, then removal, then a stock key,
    /// otherwise the stored photo is kept.
    pub async fn validate(
        &self,
        input: PlantInput,
        today: NaiveDate,
    ) -> Result<PlantDraft, AppError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        let room = Some(input.room.trim().to_string()).filter(|r| !r.is_empty());

        let added = if input.added.trim().is_empty() {
            today
        } else {
            time_utils::parse_date(&input.added)
                .ok_or_else(|| AppError::Validation("Invalid date".to_string()))?
        };

        let winterval = schedule::clamp_interval(&input.winterval);

        let stock_key = input.stock_key.trim();
        let photo = match input.upload.filter(|bytes| !bytes.is_empty()) {
            Some(bytes) => {
                let normalized =
                    tokio::task::spawn_blocking(move || photo::normalize_upload(&bytes))
                        .await
                        .map_err(|e| {
                            AppError::Internal(anyhow::anyhow!("Photo processing panicked: {}", e))
                        })??;
                PhotoUpdate::Upload {
                    bytes: normalized.bytes,
                    mime: normalized.mime,
                }
            }
            // Removal wins over the stock key the edit form pre-selects
            None if input.remove_photo => PhotoUpdate::Remove,
            None if !stock_key.is_empty() => StockImage::by_key(stock_key)
                .map(PhotoUpdate::Stock)
                .ok_or_else(|| AppError::Validation("Unknown stock image".to_string()))?,
            None => PhotoUpdate::Keep,
        };

        Ok(PlantDraft {
            name,
            room,
            added,
            winterval,
            photo,
        })
    }

    /// Add a plant for `user_id`, returning its id.
    pub async fn add(
        &self,
        user_id: i64,
        input: PlantInput,
        today: NaiveDate,
    ) -> Result<i64, AppError> {
        let draft = self.validate(input, today).await?;
        let plant_id = self.db.insert_plant(user_id, &draft).await?;
        tracing::info!(
            user_id,
            plant_id,
            winterval = draft.winterval,
            "Added plant"
        );
        Ok(plant_id)
    }

    /// Update a plant's fields, keeping its photo unless a new one is chosen.
    pub async fn edit(
        &self,
        user_id: i64,
        plant_id: i64,
        input: PlantInput,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        // Check ownership before spending time on the photo
        self.get(user_id, plant_id).await?;

        let draft = self.validate(input, today).await?;
        if !self.db.update_plant(user_id, plant_id, &draft).await? {
            return Err(not_found(plant_id));
        }
        tracing::info!(user_id, plant_id, "Edited plant");
        Ok(())
    }

    pub async fn delete(&self, user_id: i64, plant_id: i64) -> Result<(), AppError> {
        if !self.db.delete_plant(user_id, plant_id).await? {
            return Err(not_found(plant_id));
        }
        tracing::info!(user_id, plant_id, "Deleted plant");
        Ok(())
    }

    /// Record a watering on `today`.
    pub async fn water(
        &self,
        user_id: i64,
        plant_id: i64,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        if !self.db.water_plant(user_id, plant_id, today).await? {
            return Err(not_found(plant_id));
        }
        tracing::info!(user_id, plant_id, date = %today, "Watered plant");
        Ok(())
    }

    pub async fn get(&self, user_id: i64, plant_id: i64) -> Result<Plant, AppError> {
        self.db
            .get_plant(user_id, plant_id)
            .await?
            .ok_or_else(|| not_found(plant_id))
    }

    /// The user's plants sorted by name, each with its watering schedule.
    pub async fn list(&self, user_id: i64, today: NaiveDate) -> Result<Vec<PlantCard>, AppError> {
        let plants = self.db.list_plants(user_id).await?;
        Ok(plants
            .into_iter()
            .map(|plant| PlantCard::new(plant, today))
            .collect())
    }

    /// Uploaded photo bytes and MIME type.
    pub async fn photo(&self, user_id: i64, plant_id: i64) -> Result<(Vec<u8>, String), AppError> {
        let (bytes, mime) = self
            .db
            .get_photo(user_id, plant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo for plant {}", plant_id)))?;
        let mime = mime.unwrap_or_else(|| photo::sniff_mime(&bytes).to_string());
        Ok((bytes, mime))
    }
}

fn not_found(plant_id: i64) -> AppError {
    AppError::NotFound(format!("Plant {}", plant_id))
}
