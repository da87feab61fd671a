//! Event routes.
//!
//! Routes:
//! - GET    /api/events      - List events
//! - POST   /api/events      - Create an event
//! - GET    /api/events/:id  - Get an event
//! - PUT    /api/events/:id  - Update an event
//! - DELETE /api/events/:id  - Delete an event

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::middleware::SessionUser;
use crate::models::{CreateEvent, Event, UpdateEvent};
use crate::{AppState, Error, Result};

/// Build event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
}

#[axum::debug_handler]
async fn list_events(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Vec<Event>>> {
    let events = state.store.list_events(&user.user_id).await?;
    Ok(Json(events))
}

#[axum::debug_handler]
async fn get_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Event>> {
    let event = state.store.get_event(&user.user_id, &id).await?;
    Ok(Json(event))
}

#[axum::debug_handler]
async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<CreateEvent>,
) -> Result<(StatusCode, Json<Event>)> {
    input.validate().map_err(Error::Validation)?;
    let event = state.store.create_event(&user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

#[axum::debug_handler]
async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(input): Json<UpdateEvent>,
) -> Result<Json<Event>> {
    let event = state.store.update_event(&user.user_id, &id, input).await?;
    Ok(Json(event))
}

#[axum::debug_handler]
async fn delete_event(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.delete_event(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
