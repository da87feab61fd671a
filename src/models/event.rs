//! Event models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A networking event the user attended or plans to attend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// ISO 8601 date, e.g. "2026-03-14"
    pub date: String,
    pub location: Option<String>,
    pub company: Option<String>,
    /// Index into the dashboard's color palette (0-7)
    pub color_index: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub date: String,
    pub location: Option<String>,
    pub company: Option<String>,
    #[serde(default)]
    pub color_index: i64,
}

/// Input for updating an event. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub color_index: Option<i64>,
}

impl CreateEvent {
    /// Validate user-supplied fields.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        if !(0..8).contains(&self.color_index) {
            return Err("color_index must be in 0..8".to_string());
        }
        Ok(())
    }
}
