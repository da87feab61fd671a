//! API Routes for Rolo
//!
//! This module combines all routes into a single router.
//!
//! Route structure:
//! - /health - liveness (public)
//! - /api/auth/* - login flow, callback, logout, token sync (public)
//! - /api/debug-auth - cookie/session diagnostics (public)
//! - /api/profile, /api/events, /api/contacts, /api/tasks - session-protected
//!
//! The session bridge wraps everything: cookies are reconciled before any
//! handler runs, and the protected routes only check for the user context
//! the bridge injected.

mod auth;
mod contacts;
mod events;
mod profile;
pub mod status;
mod tasks;

use axum::routing::get;
use axum::Router;

use crate::middleware::{require_session, session_bridge};
use crate::AppState;

/// Build the complete router.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health endpoint (public)
        .merge(status::routes())
        // Authentication routes (public; the bridge still runs over them)
        .nest("/api/auth", auth::routes())
        // Diagnostics (public)
        .route("/api/debug-auth", get(auth::debug_auth))
        // Protected CRUD routes
        .merge(protected_routes())
        // Session bridge over everything above
        .layer(axum::middleware::from_fn_with_state(state, session_bridge))
}

/// Routes that require a session-authenticated user.
fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/profile", profile::routes())
        .nest("/api/events", events::routes())
        .nest("/api/contacts", contacts::routes())
        .nest("/api/tasks", tasks::routes())
        .layer(axum::middleware::from_fn(require_session))
}
