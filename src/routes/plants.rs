// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plant album routes for signed-in users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::csrf::{self, CSRF_FIELD};
use crate::models::Plant;
use crate::services::photo::MAX_PHOTO_BYTES;
use crate::services::schedule::DEFAULT_INTERVAL_DAYS;
use crate::services::PlantInput;
use crate::time_utils::{format_date, today};
use crate::views::{self, PlantFormValues};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

/// Plant routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/add_plant", get(add_form).post(add_plant))
        .route("/album", get(album))
        .route("/water/{id}", post(water))
        .route("/plant/{id}/edit", get(edit_form).post(edit_plant))
        .route("/plant/{id}/delete", post(delete_plant))
        .route("/plant/{id}/photo", get(photo))
}

/// Body of the small POST forms that carry nothing but the CSRF token.
#[derive(Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    csrf_token: String,
}

// ─── Album ───────────────────────────────────────────────────

async fn album(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<Response> {
    let cards = state.plants.list(user.user_id, today()).await?;
    let (jar, token) = csrf::issue(jar, &state.config.csrf_key, state.config.secure_cookies)?;
    Ok((jar, views::album_page(&cards, &token)).into_response())
}

async fn water(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plant_id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect> {
    csrf::verify(&jar, &state.config.csrf_key, &form.csrf_token)?;
    state.plants.water(user.user_id, plant_id, today()).await?;
    Ok(Redirect::to("/album"))
}

async fn delete_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plant_id): Path<i64>,
    jar: CookieJar,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect> {
    csrf::verify(&jar, &state.config.csrf_key, &form.csrf_token)?;
    state.plants.delete(user.user_id, plant_id).await?;
    Ok(Redirect::to("/album"))
}

/// Serve an uploaded photo.
async fn photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plant_id): Path<i64>,
) -> Result<Response> {
    let (bytes, mime) = state.plants.photo(user.user_id, plant_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            (header::CACHE_CONTROL, "private, max-age=300".to_string()),
        ],
        bytes,
    )
        .into_response())
}

// ─── Add / Edit ──────────────────────────────────────────────

async fn add_form(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response> {
    let values = PlantFormValues {
        added: format_date(today()),
        winterval: DEFAULT_INTERVAL_DAYS.to_string(),
        ..Default::default()
    };
    render_plant_form(&state, jar, None, &values, None)
}

async fn add_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    let submission = match read_plant_form(multipart).await {
        Ok(submission) => submission,
        Err(e) if e.is_form_error() => {
            return render_plant_form(&state, jar, None, &PlantFormValues::default(), Some(&e))
        }
        Err(e) => return Err(e),
    };
    csrf::verify(&jar, &state.config.csrf_key, &submission.csrf_token)?;

    let values = form_values(&submission.input, None);
    match state.plants.add(user.user_id, submission.input, today()).await {
        Ok(_) => Ok(Redirect::to("/album").into_response()),
        Err(e) if e.is_form_error() => render_plant_form(&state, jar, None, &values, Some(&e)),
        Err(e) => Err(e),
    }
}

async fn edit_form(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plant_id): Path<i64>,
    jar: CookieJar,
) -> Result<Response> {
    let plant = state.plants.get(user.user_id, plant_id).await?;
    let values = PlantFormValues {
        name: plant.name.clone(),
        room: plant.room.clone().unwrap_or_default(),
        added: format_date(plant.added),
        winterval: plant.winterval.to_string(),
        stock_key: plant
            .stock_image()
            .map(|s| s.key.to_string())
            .unwrap_or_default(),
        current_photo: plant.photo_url(),
    };
    render_plant_form(&state, jar, Some(plant_id), &values, None)
}

async fn edit_plant(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(plant_id): Path<i64>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response> {
    let plant = state.plants.get(user.user_id, plant_id).await?;

    let submission = match read_plant_form(multipart).await {
        Ok(submission) => submission,
        Err(e) if e.is_form_error() => {
            let values = form_values(&PlantInput::default(), Some(&plant));
            return render_plant_form(&state, jar, Some(plant_id), &values, Some(&e));
        }
        Err(e) => return Err(e),
    };
    csrf::verify(&jar, &state.config.csrf_key, &submission.csrf_token)?;

    let values = form_values(&submission.input, Some(&plant));
    match state
        .plants
        .edit(user.user_id, plant_id, submission.input, today())
        .await
    {
        Ok(()) => Ok(Redirect::to("/album").into_response()),
        Err(e) if e.is_form_error() => {
            render_plant_form(&state, jar, Some(plant_id), &values, Some(&e))
        }
        Err(e) => Err(e),
    }
}

fn render_plant_form(
    state: &AppState,
    jar: CookieJar,
    plant_id: Option<i64>,
    values: &PlantFormValues,
    error: Option<&AppError>,
) -> Result<Response> {
    let (jar, token) = csrf::issue(jar, &state.config.csrf_key, state.config.secure_cookies)?;
    let message = error.map(|e| e.to_string());
    let status = if error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    let page = views::plant_form_page(plant_id, values, &token, message.as_deref());
    Ok((status, jar, page).into_response())
}

/// Values to show again after a rejected submission.
fn form_values(input: &PlantInput, existing: Option<&Plant>) -> PlantFormValues {
    PlantFormValues {
        name: input.name.clone(),
        room: input.room.clone(),
        added: input.added.clone(),
        winterval: input.winterval.clone(),
        stock_key: input.stock_key.clone(),
        current_photo: existing.and_then(Plant::photo_url),
    }
}

// ─── Multipart parsing ───────────────────────────────────────

#[derive(Debug, Default)]
struct PlantSubmission {
    csrf_token: String,
    input: PlantInput,
}

/// Read the add/edit form.
///
/// The photo is buffered up to one byte past the size limit and the rest is
/// drained, so an oversized file is reported as `ImageTooLarge` while the
/// other fields are still read.
async fn read_plant_form(mut multipart: Multipart) -> Result<PlantSubmission> {
    let mut submission = PlantSubmission::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "photo" {
            let has_file = field.file_name().is_some_and(|f| !f.is_empty());
            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                let room = (MAX_PHOTO_BYTES + 1).saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            if has_file && !bytes.is_empty() {
                submission.input.upload = Some(bytes);
            }
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        match name.as_str() {
            CSRF_FIELD => submission.csrf_token = value,
            "name" => submission.input.name = value,
            "room" => submission.input.room = value,
            "added" => submission.input.added = value,
            "winterval" => submission.input.winterval = value,
            "stock_key" => submission.input.stock_key = value,
            "remove_photo" => submission.input.remove_photo = !value.is_empty(),
            _ => {}
        }
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::ImageTooLarge
    } else {
        AppError::BadRequest(err.body_text())
    }
}
