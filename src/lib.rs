// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plant Tracker: a personal plant-care album
//!
//! Users keep a list of their plants with a photo and a watering interval,
//! and the album shows when each plant is next due for water.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use db::PlantDb;
use services::{AccountService, PlantService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: PlantDb,
    pub accounts: AccountService,
    pub plants: PlantService,
}

impl AppState {
    pub fn new(config: Config, db: PlantDb) -> Self {
        Self {
            accounts: AccountService::new(db.clone()),
            plants: PlantService::new(db.clone()),
            config,
            db,
        }
    }
}
