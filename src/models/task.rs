//! Task (action item) models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A follow-up action item, optionally tied to a contact and/or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub contact_id: Option<String>,
    pub event_id: Option<String>,
    pub title: String,
    /// ISO 8601 date, if a deadline was set
    pub due_date: Option<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub contact_id: Option<String>,
    pub event_id: Option<String>,
    pub title: String,
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Input for updating a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub contact_id: Option<String>,
    pub event_id: Option<String>,
    pub title: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
}

/// Filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub event_id: Option<String>,
    pub contact_id: Option<String>,
    pub completed: Option<bool>,
}

impl CreateTask {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        Ok(())
    }
}
