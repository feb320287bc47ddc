// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod password;
pub mod photo;
pub mod plants;
pub mod schedule;

pub use accounts::{AccountService, Registration};
pub use photo::StockImage;
pub use plants::{PlantInput, PlantService};
