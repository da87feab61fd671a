//! Health and status routes.

use axum::{routing::get, Json, Router};
use once_cell::sync::OnceCell;
use serde_json::{json, Value};
use std::time::Instant;

use crate::AppState;

static STARTUP_TIME: OnceCell<Instant> = OnceCell::new();

/// Record the process start for uptime reporting. Called once in main.
pub fn init_startup_time() {
    let _ = STARTUP_TIME.set(Instant::now());
}

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[axum::debug_handler]
async fn health() -> Json<Value> {
    let uptime_secs = STARTUP_TIME.get().map(|t| t.elapsed().as_secs());

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime_secs,
    }))
}
