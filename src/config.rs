//! Configuration for Rolo.
//!
//! Loaded once from environment variables (with `.env` support via dotenvy)
//! and exposed through the global [`config()`] accessor. Service constructors
//! that need a section take it by value so tests can build their own.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub store: StoreConfig,
    pub cookies: CookieConfig,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// SQLite database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Hosted identity provider (GoTrue-compatible REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL, e.g. `https://abcd1234.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent as the `apikey` header.
    pub anon_key: String,
}

/// Record store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory".
    pub backend: StoreBackend,
    /// Artificial latency applied by the memory backend, in milliseconds.
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

impl StoreBackend {
    fn from_env(s: &str) -> Self {
        match s {
            "memory" => Self::Memory,
            _ => Self::Sqlite,
        }
    }
}

/// Cookie issuance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Set the Secure attribute on issued cookies (disable for local HTTP).
    pub secure: bool,
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("ROLO_HOST", "0.0.0.0"),
                port: env_or("ROLO_PORT", "8080").parse().unwrap_or(8080),
            },
            database: DatabaseConfig {
                path: env_or("ROLO_DATABASE_PATH", "data/rolo.db"),
            },
            provider: ProviderConfig {
                url: env_or("ROLO_PROVIDER_URL", "http://localhost:9999"),
                anon_key: env_or("ROLO_PROVIDER_ANON_KEY", ""),
            },
            store: StoreConfig {
                backend: StoreBackend::from_env(&env_or("ROLO_STORE_BACKEND", "sqlite")),
                simulated_latency_ms: env_or("ROLO_SIMULATED_LATENCY_MS", "0")
                    .parse()
                    .unwrap_or(0),
            },
            cookies: CookieConfig {
                secure: env_or("ROLO_SECURE_COOKIES", "true") == "true",
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Initialize the global configuration. Idempotent; later calls return
/// the already-loaded value.
pub fn init() -> &'static Config {
    CONFIG.get_or_init(|| {
        // Best effort; a missing .env file is fine
        let _ = dotenvy::dotenv();
        Config::from_env()
    })
}

/// Access the global configuration. Initializes from the environment on
/// first use.
pub fn config() -> &'static Config {
    init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_from_env() {
        assert_eq!(StoreBackend::from_env("memory"), StoreBackend::Memory);
        assert_eq!(StoreBackend::from_env("sqlite"), StoreBackend::Sqlite);
        assert_eq!(StoreBackend::from_env("bogus"), StoreBackend::Sqlite);
    }
}
