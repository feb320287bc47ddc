// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered HTML pages.
//!
//! Every interpolated value goes through [`escape`].

use crate::middleware::csrf::CSRF_FIELD;
use crate::models::PlantCard;
use crate::services::photo::STOCK_IMAGES;
use crate::services::schedule::{MAX_INTERVAL_DAYS, MIN_INTERVAL_DAYS};
use crate::time_utils::format_date;
use axum::http::StatusCode;
use axum::response::Html;
use std::fmt::Write as _;

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, signed_in: bool, body: &str) -> Html<String> {
    let nav = if signed_in {
        r#"<a href="/album">My plants</a> <a href="/add_plant">Add plant</a> <a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#
    };
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Plant Tracker</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header><a class="brand" href="/">Plant Tracker</a><nav>{nav}</nav></header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    ))
}

fn csrf_input(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="{CSRF_FIELD}" value="{}">"#,
        escape(token)
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

pub fn index_page(signed_in: bool) -> Html<String> {
    let action = if signed_in {
        r#"<a class="button" href="/album">Go to my plants</a>"#
    } else {
        r#"<a class="button" href="/register">Get started</a>"#
    };
    layout(
        "Welcome",
        signed_in,
        &format!(
            "<h1>Never forget to water again</h1>\n\
             <p>Keep an album of your plants and see at a glance which ones need water.</p>\n\
             {action}"
        ),
    )
}

/// Login page, which also carries the registration form.
pub fn login_page(csrf_token: &str, error: Option<&str>) -> Html<String> {
    let csrf = csrf_input(csrf_token);
    layout(
        "Log in",
        false,
        &format!(
            r#"<h1>Welcome back</h1>
{error}
<section class="forms">
<form method="post" action="/login">
{csrf}
<h2>Log in</h2>
<label>Username <input name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>
<form method="post" action="/register">
{csrf}
<h2>Register</h2>
<label>Username <input name="username" autocomplete="username" maxlength="64" required></label>
<label>Email (optional) <input type="email" name="email" autocomplete="email"></label>
<label>Password <input type="password" name="password" autocomplete="new-password" required></label>
<label>Confirm password <input type="password" name="confirm_password" autocomplete="new-password" required></label>
<button type="submit">Register</button>
</form>
</section>"#,
            error = error_banner(error),
        ),
    )
}

/// Values shown in the add/edit plant form.
#[derive(Debug, Clone, Default)]
pub struct PlantFormValues {
    pub name: String,
    pub room: String,
    pub added: String,
    pub winterval: String,
    pub stock_key: String,
    /// Edit only: URL of the current photo
    pub current_photo: Option<String>,
}

/// Add form (`plant_id` is `None`) or edit form.
pub fn plant_form_page(
    plant_id: Option<i64>,
    values: &PlantFormValues,
    csrf_token: &str,
    error: Option<&str>,
) -> Html<String> {
    let (title, action) = match plant_id {
        Some(id) => ("Edit plant", format!("/plant/{}/edit", id)),
        None => ("Add a plant", "/add_plant".to_string()),
    };

    let mut stock_options = String::from(r#"<option value="">(none)</option>"#);
    for stock in STOCK_IMAGES {
        let selected = if stock.key == values.stock_key {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            stock_options,
            r#"<option value="{}"{}>{}</option>"#,
            escape(stock.key),
            selected,
            escape(stock.label)
        );
    }

    let current_photo = match (&values.current_photo, plant_id) {
        (Some(url), Some(_)) => format!(
            r#"<figure class="current"><img src="{}" alt="Current photo"></figure>
<label class="inline"><input type="checkbox" name="remove_photo" value="1"> Remove current photo</label>"#,
            escape(url)
        ),
        _ => String::new(),
    };

    layout(
        title,
        true,
        &format!(
            r#"<h1>{title}</h1>
{error}
<form method="post" action="{action}" enctype="multipart/form-data">
{csrf}
<label>Name <input name="name" value="{name}" required></label>
<label>Room <input name="room" value="{room}"></label>
<label>Added <input type="date" name="added" value="{added}"></label>
<label>Water every (days) <input type="number" name="winterval" min="{min}" max="{max}" value="{winterval}"></label>
{current_photo}
<label>Upload a photo (JPEG, PNG, WebP or GIF, max 2 MB) <input type="file" name="photo" accept="image/*"></label>
<label>…or pick a stock image <select name="stock_key">{stock_options}</select></label>
<button type="submit">Save</button>
</form>"#,
            error = error_banner(error),
            action = escape(&action),
            csrf = csrf_input(csrf_token),
            name = escape(&values.name),
            room = escape(&values.room),
            added = escape(&values.added),
            winterval = escape(&values.winterval),
            min = MIN_INTERVAL_DAYS,
            max = MAX_INTERVAL_DAYS,
        ),
    )
}

/// Human-readable due status.
pub fn due_label(days_left: i64) -> String {
    match days_left {
        0 => "Water today".to_string(),
        1 => "Due tomorrow".to_string(),
        d if d > 1 => format!("Due in {} days", d),
        -1 => "Overdue by 1 day".to_string(),
        d => format!("Overdue by {} days", -d),
    }
}

pub fn album_page(cards: &[PlantCard], csrf_token: &str) -> Html<String> {
    let csrf = csrf_input(csrf_token);
    let mut body = String::from("<h1>My plants</h1>\n");

    if cards.is_empty() {
        body.push_str(r#"<p>No plants yet. <a href="/add_plant">Add your first one.</a></p>"#);
        return layout("My plants", true, &body);
    }

    body.push_str(r#"<ul class="album">"#);
    for card in cards {
        let plant = &card.plant;
        let photo = plant
            .photo_url()
            .map(|url| {
                format!(
                    r#"<img src="{}" alt="{}">"#,
                    escape(&url),
                    escape(&plant.name)
                )
            })
            .unwrap_or_else(|| r#"<div class="no-photo"></div>"#.to_string());
        let room = plant
            .room
            .as_deref()
            .map(|r| format!(r#"<p class="room">{}</p>"#, escape(r)))
            .unwrap_or_default();
        let watered = plant
            .watered
            .map(format_date)
            .unwrap_or_else(|| "never".to_string());
        let status = if card.days_left < 0 { "overdue" } else { "ok" };

        let _ = write!(
            body,
            r#"
<li class="card {status}">
{photo}
<h2>{name}</h2>
{room}
<dl>
<dt>Added</dt><dd>{added}</dd>
<dt>Last watered</dt><dd>{watered}</dd>
<dt>Next watering</dt><dd>{next}</dd>
</dl>
<p class="due">{due}</p>
<form method="post" action="/water/{id}">{csrf}<button type="submit">Watered today</button></form>
<a href="/plant/{id}/edit">Edit</a>
<form method="post" action="/plant/{id}/delete" class="delete">{csrf}<button type="submit">Delete</button></form>
</li>"#,
            name = escape(&plant.name),
            added = format_date(plant.added),
            next = format_date(card.next_watering),
            due = escape(&due_label(card.days_left)),
            id = plant.id_plant,
        );
    }
    body.push_str("\n</ul>");

    layout("My plants", true, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    layout(
        status.canonical_reason().unwrap_or("Error"),
        false,
        &format!(
            r#"<h1>{}</h1>
<p>{}</p>
<p><a href="/">Back to start</a></p>"#,
            status.as_u16(),
            escape(message)
        ),
    )
}
