//! Rolo - Networking Contacts Tracker
//!
//! A CRUD service for events, contacts, and follow-up tasks, with session
//! bridging against a hosted identity provider: cookie reconciliation on
//! every request, a callback exchange for logins, one canonical cookie
//! clearing routine, and a loop guard over repeated session fetches.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
