// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plant model and its watering schedule.

use crate::services::photo::StockImage;
use crate::services::schedule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which photo column set is active for a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PhotoSource {
    /// `photo` + `photo_mime` hold normalized uploaded bytes
    Upload,
    /// `photo_path` names a whitelisted stock image
    Stock,
    /// No photo
    None,
}

/// Row of the `Plants` table, without the photo blob.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Plant {
    pub id_plant: i64,
    /// Owner
    pub user_id: i64,
    pub name: String,
    /// Optional room label
    pub room: Option<String>,
    /// Acquisition date
    pub added: NaiveDate,
    /// Last watering, if any
    pub watered: Option<NaiveDate>,
    /// Days between waterings
    pub winterval: i64,
    pub photo_path: Option<String>,
    pub photo_source: PhotoSource,
    pub photo_mime: Option<String>,
}

impl Plant {
    /// Date the schedule counts from: last watering, else acquisition.
    pub fn reference_date(&self) -> NaiveDate {
        self.watered.unwrap_or(self.added)
    }

    pub fn next_watering(&self) -> NaiveDate {
        let interval = self.winterval.clamp(
            i64::from(schedule::MIN_INTERVAL_DAYS),
            i64::from(schedule::MAX_INTERVAL_DAYS),
        ) as u32;
        schedule::next_due(self.reference_date(), interval)
    }

    pub fn days_left(&self, today: NaiveDate) -> i64 {
        schedule::days_left(self.next_watering(), today)
    }

    /// The stock image, when this plant uses one that is still whitelisted.
    pub fn stock_image(&self) -> Option<&'static StockImage> {
        match self.photo_source {
            PhotoSource::Stock => self.photo_path.as_deref().and_then(StockImage::by_path),
            _ => None,
        }
    }

    /// URL of the plant's photo, if it has one.
    pub fn photo_url(&self) -> Option<String> {
        match self.photo_source {
            PhotoSource::Upload => Some(format!("/plant/{}/photo", self.id_plant)),
            PhotoSource::Stock => self.stock_image().map(StockImage::url),
            PhotoSource::None => None,
        }
    }
}

/// Photo change requested by an add or edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoUpdate {
    /// Leave the stored photo columns untouched
    Keep,
    /// Store normalized uploaded bytes
    Upload { bytes: Vec<u8>, mime: String },
    /// Reference a stock image
    Stock(&'static StockImage),
    /// Clear all photo columns
    Remove,
}

/// Validated plant fields ready to write.
#[derive(Debug, Clone)]
pub struct PlantDraft {
    pub name: String,
    pub room: Option<String>,
    pub added: NaiveDate,
    pub winterval: u32,
    pub photo: PhotoUpdate,
}

/// A plant annotated with its computed schedule, as shown in the album.
#[derive(Debug, Clone, Serialize)]
pub struct PlantCard {
    #[serde(flatten)]
    pub plant: Plant,
    pub next_watering: NaiveDate,
    pub days_left: i64,
}

impl PlantCard {
    pub fn new(plant: Plant, today: NaiveDate) -> Self {
        Self {
            next_watering: plant.next_watering(),
            days_left: plant.days_left(today),
            plant,
        }
    }
}
