//! Loop guard: a two-parameter circuit breaker over session fetches.
//!
//! Repeated failed session fetches from a browser used to cause infinite
//! redirect loops between the login and dashboard pages. The guard counts
//! fetch attempts per client inside a sliding window and, once the
//! threshold is hit, tells the caller to degrade to the fallback page
//! instead of fetching again. Counters live behind [`CounterStore`] so
//! the map can be swapped without touching the state machine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Attempts inside the window before the guard trips.
const TRIP_THRESHOLD: u32 = 2;

/// Sliding window within which attempts accumulate.
const ATTEMPT_WINDOW: Duration = Duration::from_secs(3);

/// Delay after which an untripped counter is cleared.
const RESET_DELAY: Duration = Duration::from_secs(5);

/// Where tripped clients are sent.
pub const FALLBACK_PATH: &str = "/dashboard";

/// Query string marker attached to the fallback redirect.
pub const LOOP_MARKER: &str = "degraded=loop_detected";

/// Per-client attempt record.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRecord {
    pub count: u32,
    pub last_attempt: Instant,
    /// Drawn from a guard-wide monotonic counter on every write, so a
    /// delayed reset from an earlier cycle can never match a record
    /// written after it. The reset only fires on an exact match.
    pub generation: u64,
}

/// Storage seam for attempt counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<AttemptRecord>;
    async fn put(&self, key: &str, record: AttemptRecord);
    async fn remove(&self, key: &str);
}

/// In-memory counter store. Production and tests both use this; the
/// trait exists so a shared store could replace it per deployment.
#[derive(Default)]
pub struct MemoryCounterStore {
    records: RwLock<HashMap<String, AttemptRecord>>,
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self, key: &str) -> Option<AttemptRecord> {
        self.records.read().await.get(key).copied()
    }

    async fn put(&self, key: &str, record: AttemptRecord) {
        self.records.write().await.insert(key.to_string(), record);
    }

    async fn remove(&self, key: &str) {
        self.records.write().await.remove(key);
    }
}

/// Outcome of a loop-guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCheck {
    /// Attempt recorded; the caller may fetch the session.
    Proceed,
    /// Threshold hit; counters were reset. `redirect` is the fallback
    /// target, or None when the caller is already on the fallback page.
    Tripped { redirect: Option<String> },
}

pub struct LoopGuard {
    store: Arc<dyn CounterStore>,
    threshold: u32,
    window: Duration,
    reset_delay: Duration,
    generation: AtomicU64,
}

impl LoopGuard {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            threshold: TRIP_THRESHOLD,
            window: ATTEMPT_WINDOW,
            reset_delay: RESET_DELAY,
            generation: AtomicU64::new(0),
        }
    }

    /// Override the fixed parameters. Test seam.
    pub fn with_params(
        store: Arc<dyn CounterStore>,
        threshold: u32,
        window: Duration,
        reset_delay: Duration,
    ) -> Self {
        Self {
            store,
            threshold,
            window,
            reset_delay,
            generation: AtomicU64::new(0),
        }
    }

    /// Record a session-fetch attempt for `client_key` and decide whether
    /// the caller may proceed. `current_path` is the page the client is
    /// on; a trip from the fallback page itself never redirects again.
    pub async fn check(&self, client_key: &str, current_path: &str) -> LoopCheck {
        let now = Instant::now();
        let record = self.store.get(client_key).await;

        // Attempts beyond the window are stale; start a fresh count
        let fresh = record.filter(|r| now.duration_since(r.last_attempt) < self.window);

        if let Some(record) = fresh {
            if record.count >= self.threshold {
                self.store.remove(client_key).await;
                debug!(client = %client_key, count = record.count, "Loop guard tripped");

                let redirect = if current_path == FALLBACK_PATH {
                    None
                } else {
                    Some(format!("{}?{}", FALLBACK_PATH, LOOP_MARKER))
                };
                return LoopCheck::Tripped { redirect };
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let count = fresh.map(|r| r.count + 1).unwrap_or(1);

        self.store
            .put(
                client_key,
                AttemptRecord {
                    count,
                    last_attempt: now,
                    generation,
                },
            )
            .await;

        self.schedule_reset(client_key.to_string(), generation);

        LoopCheck::Proceed
    }

    /// Clear the counter after the reset delay, unless it was written
    /// again in the meantime.
    fn schedule_reset(&self, key: String, generation: u64) {
        let store = self.store.clone();
        let delay = self.reset_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(record) = store.get(&key).await {
                if record.generation == generation {
                    store.remove(&key).await;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> LoopGuard {
        LoopGuard::new(Arc::new(MemoryCounterStore::default()))
    }

    #[tokio::test]
    async fn test_two_attempts_then_trip_exactly_once() {
        let guard = guard();

        assert_eq!(guard.check("c1", "/login").await, LoopCheck::Proceed);
        assert_eq!(guard.check("c1", "/login").await, LoopCheck::Proceed);

        let third = guard.check("c1", "/login").await;
        assert_eq!(
            third,
            LoopCheck::Tripped {
                redirect: Some("/dashboard?degraded=loop_detected".to_string())
            }
        );

        // Counters were reset; the next attempt proceeds again
        assert_eq!(guard.check("c1", "/login").await, LoopCheck::Proceed);
    }

    #[tokio::test]
    async fn test_no_redirect_from_fallback_page() {
        let guard = guard();
        guard.check("c1", FALLBACK_PATH).await;
        guard.check("c1", FALLBACK_PATH).await;

        assert_eq!(
            guard.check("c1", FALLBACK_PATH).await,
            LoopCheck::Tripped { redirect: None }
        );
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let guard = guard();
        guard.check("c1", "/login").await;
        guard.check("c1", "/login").await;

        // A different client is unaffected by c1's attempts
        assert_eq!(guard.check("c2", "/login").await, LoopCheck::Proceed);
    }

    #[tokio::test]
    async fn test_stale_attempts_do_not_trip() {
        let store = Arc::new(MemoryCounterStore::default());
        let guard = LoopGuard::new(store.clone());

        // Simulate two attempts made longer than the window ago
        let old = Instant::now() - Duration::from_secs(4);
        store
            .put(
                "c1",
                AttemptRecord {
                    count: 2,
                    last_attempt: old,
                    generation: 1,
                },
            )
            .await;

        assert_eq!(guard.check("c1", "/login").await, LoopCheck::Proceed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_from_previous_cycle_leaves_fresh_counter_alone() {
        let store = Arc::new(MemoryCounterStore::default());
        let guard = LoopGuard::new(store.clone());

        // First cycle: two attempts and a trip, leaving reset tasks pending
        guard.check("c1", "/login").await;
        guard.check("c1", "/login").await;
        assert!(matches!(
            guard.check("c1", "/login").await,
            LoopCheck::Tripped { .. }
        ));

        // Second cycle starts before those resets fire
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(guard.check("c1", "/login").await, LoopCheck::Proceed);

        // First cycle's resets come due now; they must not touch the
        // record written after them
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(
            store.get("c1").await.is_some(),
            "reset from the previous cycle cleared a fresh counter"
        );

        // Rapid attempts still accumulate; the third one trips
        assert_eq!(guard.check("c1", "/login").await, LoopCheck::Proceed);
        assert!(matches!(
            guard.check("c1", "/login").await,
            LoopCheck::Tripped { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_reset_clears_untripped_counter() {
        let store = Arc::new(MemoryCounterStore::default());
        let guard = LoopGuard::new(store.clone());

        guard.check("c1", "/login").await;
        assert!(store.get("c1").await.is_some());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.get("c1").await.is_none());
    }
}
