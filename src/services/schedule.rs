// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Watering schedule arithmetic.

use chrono::{Days, NaiveDate};

pub const MIN_INTERVAL_DAYS: u32 = 1;
pub const MAX_INTERVAL_DAYS: u32 = 365;
pub const DEFAULT_INTERVAL_DAYS: u32 = 7;

/// Date a plant is next due: `reference + interval_days`.
///
/// `reference` is the last watering date, or the date the plant was added
/// if it has never been watered.
pub fn next_due(reference: NaiveDate, interval_days: u32) -> NaiveDate {
    reference
        .checked_add_days(Days::new(u64::from(interval_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Days from `today` until `next`; negative when overdue.
pub fn days_left(next: NaiveDate, today: NaiveDate) -> i64 {
    (next - today).num_days()
}

/// Parse a watering interval from form input and clamp it into
/// `[MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS]`.
///
/// Integers outside the range (including ones too large for `i64`) saturate
/// to the nearer bound. Anything that is not an integer falls back to the
/// default interval.
pub fn clamp_interval(raw: &str) -> u32 {
    let raw = raw.trim();
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match overflowing_sign(raw) {
            Some(true) => i64::MIN,
            Some(false) => i64::MAX,
            None => return DEFAULT_INTERVAL_DAYS,
        },
    };
    value.clamp(i64::from(MIN_INTERVAL_DAYS), i64::from(MAX_INTERVAL_DAYS)) as u32
}

/// For an all-digit string that failed to parse, report whether it was
/// negative. Returns `None` when the input is not an integer at all.
fn overflowing_sign(raw: &str) -> Option<bool> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(negative)
    } else {
        None
    }
}
