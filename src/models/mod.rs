// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod plant;
pub mod user;

pub use plant::{PhotoSource, PhotoUpdate, Plant, PlantCard, PlantDraft};
pub use user::User;
