//! Application state for Rolo.
//!
//! Contains the shared state that is passed to all handlers. Everything
//! that used to be ambient (cached clients, module-level counters) lives
//! here explicitly so tests can construct their own.

use std::sync::Arc;

use crate::config::Config;
use crate::db::DbPool;
use crate::services::{
    build_store, LoopGuard, MemoryCounterStore, ProviderClient, RecordStore,
};
use crate::services::cookies;
use crate::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Identity provider client.
    pub provider: Arc<ProviderClient>,
    /// Record store (SQLite or in-memory, per configuration).
    pub store: Arc<dyn RecordStore>,
    /// Loop-detection circuit breaker.
    pub loop_guard: Arc<LoopGuard>,
    /// Session cookie base name, derived once from the provider URL.
    pub session_cookie_base: String,
    /// Whether issued cookies carry the Secure attribute.
    pub secure_cookies: bool,
}

impl AppState {
    /// Create application state from the global configuration.
    pub async fn new() -> Result<Self> {
        let config = crate::config::config();

        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Ok(Self::from_parts(config, db))
    }

    /// Assemble state from an explicit configuration and pool. Tests use
    /// this with an in-memory pool and a mock provider URL.
    pub fn from_parts(config: &Config, db: DbPool) -> Self {
        let provider = Arc::new(ProviderClient::new(config.provider.clone()));
        let store = build_store(&config.store, db.clone());
        let loop_guard = Arc::new(LoopGuard::new(Arc::new(MemoryCounterStore::default())));
        let session_cookie_base = cookies::session_cookie_base(&config.provider.url);

        Self {
            db,
            provider,
            store,
            loop_guard,
            session_cookie_base,
            secure_cookies: config.cookies.secure,
        }
    }
}
