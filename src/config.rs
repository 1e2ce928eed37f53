//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable numeric values
//! fall back to their defaults; a bad listen address, an unknown backend or
//! a PostgreSQL backend without `DATABASE_URL` is an error.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::session::SwipeThresholds;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is not a socket address.
    #[error("invalid LISTEN_ADDR {value:?}: {source}")]
    InvalidListenAddr {
        /// Raw value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// `STORE_BACKEND` is neither `memory` nor `postgres`.
    #[error("unknown STORE_BACKEND {0:?}; expected \"memory\" or \"postgres\"")]
    UnknownBackend(String),

    /// A variable required by the selected backend is not set.
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which adapter backs the store ports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// [`crate::store::InMemoryStore`].
    #[default]
    Memory,
    /// [`crate::store::PostgresStore`].
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection string.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Minimum idle connections.
    pub min_connections: u32,
    /// Seconds to wait when acquiring a connection.
    pub connect_timeout_secs: u64,
}

/// Feed paging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// Leads fetched per feed page.
    pub page_size: u32,
    /// Remaining-candidate count at or below which the next page is loaded.
    pub low_water_mark: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            low_water_mark: 3,
        }
    }
}

/// Data loaded into the in-memory store at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedConfig {
    /// JSON array of leads.
    pub leads_path: Option<PathBuf>,
    /// Account registered at startup.
    pub user_email: Option<String>,
    /// Password for [`SeedConfig::user_email`].
    pub user_password: Option<String>,
}

/// Top-level configuration.
///
/// Loaded once at startup via [`LeadSwipeConfig::from_env`].
#[derive(Debug, Clone)]
pub struct LeadSwipeConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Store adapter.
    pub store_backend: StoreBackend,
    /// PostgreSQL settings; `None` unless the backend is PostgreSQL.
    pub database: Option<DatabaseConfig>,
    /// Feed paging.
    pub feed: FeedConfig,
    /// Swipe gesture thresholds.
    pub swipe: SwipeThresholds,
    /// Capacity of the notification broadcast channel.
    pub event_bus_capacity: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Log output format.
    pub log_format: LogFormat,
    /// In-memory seed data.
    pub seed: SeedConfig,
}

impl Default for LeadSwipeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store_backend: StoreBackend::Memory,
            database: None,
            feed: FeedConfig::default(),
            swipe: SwipeThresholds::default(),
            event_bus_capacity: 10_000,
            request_timeout: Duration::from_secs(30),
            log_format: LogFormat::Pretty,
            seed: SeedConfig::default(),
        }
    }
}

impl LeadSwipeConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// See [`LeadSwipeConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns the raw value of
    /// a variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `LISTEN_ADDR` does not parse,
    /// `STORE_BACKEND` is unknown, or `DATABASE_URL` is missing for the
    /// PostgreSQL backend.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let env = Env(&lookup);

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidListenAddr { value, source })?,
            None => defaults.listen_addr,
        };

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Memory,
        };

        let database = match store_backend {
            StoreBackend::Memory => None,
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: env.parse("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: env.parse("DATABASE_MIN_CONNECTIONS", 2),
                connect_timeout_secs: env.parse("DATABASE_CONNECT_TIMEOUT_SECS", 5),
            }),
        };

        let feed = FeedConfig {
            page_size: env.parse("FEED_PAGE_SIZE", defaults.feed.page_size).max(1),
            low_water_mark: env.parse("FEED_LOW_WATER_MARK", defaults.feed.low_water_mark),
        };

        let swipe = SwipeThresholds {
            hint_px: env.parse("SWIPE_HINT_THRESHOLD_PX", defaults.swipe.hint_px),
            commit_px: env.parse("SWIPE_COMMIT_THRESHOLD_PX", defaults.swipe.commit_px),
            commit_delay: Duration::from_millis(env.parse(
                "SWIPE_COMMIT_DELAY_MS",
                u64::try_from(defaults.swipe.commit_delay.as_millis()).unwrap_or(300),
            )),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json" | "JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            store_backend,
            database,
            feed,
            swipe,
            event_bus_capacity: env.parse("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            request_timeout: Duration::from_secs(env.parse("REQUEST_TIMEOUT_SECS", 30)),
            log_format,
            seed: SeedConfig {
                leads_path: lookup("SEED_LEADS_PATH").map(PathBuf::from),
                user_email: lookup("SEED_USER_EMAIL"),
                user_password: lookup("SEED_USER_PASSWORD"),
            },
        })
    }
}

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Parses a variable as `T`, returning `default` on missing or invalid
    /// values.
    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        (self.0)(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
