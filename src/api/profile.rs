//! Profile routes.
//!
//! Routes:
//! - GET /api/profile - Own profile (created empty on first read)
//! - PUT /api/profile - Update display fields

use axum::{extract::State, routing::get, Extension, Json, Router};

use crate::middleware::SessionUser;
use crate::models::{Profile, UpdateProfile};
use crate::{db, AppState, Result};

/// Build profile routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[axum::debug_handler]
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Profile>> {
    let profile = db::get_or_create_profile(&state.db, &user.user_id).await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<Profile>> {
    let profile = db::update_profile(&state.db, &user.user_id, input).await?;
    Ok(Json(profile))
}
