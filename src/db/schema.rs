// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL DDL for the SQLite database and column upgrades for older files.

/// Tables created on a fresh database.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS Users(
        user_id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE COLLATE NOCASE,
        email TEXT,
        hashed_password TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS Plants(
        id_plant INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        room TEXT,
        added TEXT NOT NULL,
        watered TEXT,
        winterval INTEGER NOT NULL DEFAULT 7 CHECK (winterval BETWEEN 1 AND 365),
        photo BLOB,
        photo_path TEXT,
        photo_source TEXT NOT NULL DEFAULT 'none'
            CHECK (photo_source IN ('upload', 'stock', 'none')),
        photo_mime TEXT,
        FOREIGN KEY (user_id) REFERENCES Users(user_id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_plants_user ON Plants(user_id, name)",
];

/// A column that older databases may lack.
pub struct AddedColumn {
    pub table: &'static str,
    pub column: &'static str,
    pub definition: &'static str,
}

/// Columns introduced after the first schema, in the order they were added.
pub const ADDED_COLUMNS: &[AddedColumn] = &[
    AddedColumn {
        table: "Users",
        column: "email",
        definition: "TEXT",
    },
    AddedColumn {
        table: "Plants",
        column: "photo_path",
        definition: "TEXT",
    },
    AddedColumn {
        table: "Plants",
        column: "photo_source",
        definition: "TEXT NOT NULL DEFAULT 'none'",
    },
    AddedColumn {
        table: "Plants",
        column: "photo_mime",
        definition: "TEXT",
    },
];

/// Legacy rows stored raw photo bytes before `photo_source` existed.
pub const BACKFILL_PHOTO_SOURCE: &str =
    "UPDATE Plants SET photo_source = 'upload' WHERE photo IS NOT NULL AND photo_source = 'none'";

/// Columns selected for a `Plant`, excluding the photo blob.
pub const PLANT_COLUMNS: &str = "id_plant, user_id, name, room, added, watered, winterval, \
     photo_path, photo_source, photo_mime";
