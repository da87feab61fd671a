//! Contact routes.
//!
//! Routes:
//! - GET    /api/contacts       - List contacts (optional ?event_id=)
//! - POST   /api/contacts       - Create a contact
//! - GET    /api/contacts/:id   - Get a contact
//! - PUT    /api/contacts/:id   - Update a contact
//! - DELETE /api/contacts/:id   - Delete a contact

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::middleware::SessionUser;
use crate::models::{Contact, CreateContact, UpdateContact};
use crate::{AppState, Error, Result};

/// Build contact routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}

#[derive(Debug, Deserialize, Default)]
struct ListContactsQuery {
    event_id: Option<String>,
}

#[axum::debug_handler]
async fn list_contacts(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<ListContactsQuery>,
) -> Result<Json<Vec<Contact>>> {
    let contacts = state
        .store
        .list_contacts(&user.user_id, query.event_id.as_deref())
        .await?;
    Ok(Json(contacts))
}

#[axum::debug_handler]
async fn get_contact(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    let contact = state.store.get_contact(&user.user_id, &id).await?;
    Ok(Json(contact))
}

#[axum::debug_handler]
async fn create_contact(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<CreateContact>,
) -> Result<(StatusCode, Json<Contact>)> {
    input.validate().map_err(Error::Validation)?;
    let contact = state.store.create_contact(&user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[axum::debug_handler]
async fn update_contact(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(input): Json<UpdateContact>,
) -> Result<Json<Contact>> {
    let contact = state.store.update_contact(&user.user_id, &id, input).await?;
    Ok(Json(contact))
}

#[axum::debug_handler]
async fn delete_contact(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store.delete_contact(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
