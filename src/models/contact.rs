//! Contact models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person met at an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    pub user_id: String,
    /// Event where this person was met, if recorded
    pub event_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
    /// Storage URL of an attached voice memo
    pub voice_memo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a contact.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContact {
    pub event_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
    pub voice_memo_url: Option<String>,
}

/// Input for updating a contact. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub event_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
    pub voice_memo_url: Option<String>,
}

impl CreateContact {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        Ok(())
    }
}
