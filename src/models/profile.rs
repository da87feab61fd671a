//! Profile models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Display profile for an authenticated user. One row per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for updating profile display fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub avatar_url: Option<String>,
}
