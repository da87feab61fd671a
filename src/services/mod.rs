//! Services for Rolo.
//!
//! - `provider`: REST client for the hosted identity provider
//! - `cookies`: session cookie codec and the canonical clearing routine
//! - `loop_guard`: circuit breaker over repeated session fetches
//! - `store`: pluggable record storage (SQLite or in-memory)

pub mod cookies;
mod loop_guard;
mod provider;
mod store;

pub use loop_guard::{
    AttemptRecord, CounterStore, LoopCheck, LoopGuard, MemoryCounterStore, FALLBACK_PATH,
    LOOP_MARKER,
};
pub use provider::{OtpType, ProviderClient, ProviderUser};
pub use store::{build_store, MemoryStore, RecordStore, SqliteStore};
