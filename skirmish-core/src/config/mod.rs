//! Configuration management for skirmish
//!
//! Environment-based configuration with defaults, TOML file loading, and
//! validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Membership store configuration
    pub store: StoreConfig,

    /// Match lifecycle policy
    pub matches: MatchConfig,

    /// Live roster configuration
    pub roster: RosterConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Membership store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path
    pub db_path: PathBuf,

    /// Pool checkout timeout; exceeding it surfaces a transient failure
    #[serde(with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// SQLite busy timeout
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

/// Match lifecycle policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Member capacity for newly created matches
    pub max_players: usize,

    /// Longest accepted match title
    pub max_title_len: usize,
}

/// Live roster configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Sessions idle longer than this are evicted
    #[serde(with = "humantime_serde")]
    pub idle_session_ttl: Duration,

    /// How often the eviction sweep runs
    #[serde(with = "humantime_serde")]
    pub eviction_interval: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:4000".parse().unwrap(),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/skirmish.db"),
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_players: 5,
            max_title_len: 100,
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            idle_session_ttl: Duration::from_secs(30 * 60),
            eviction_interval: Duration::from_secs(60),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `SKIRMISH_<SECTION>_<KEY>`, e.g.
    /// `SKIRMISH_SERVER_BIND_ADDRESS=0.0.0.0:4000`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(addr) = env::var("SKIRMISH_SERVER_BIND_ADDRESS") {
            config.server.bind_address = addr
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid bind address: {}", e)))?;
        }

        if let Ok(db_path) = env::var("SKIRMISH_STORE_DB_PATH") {
            config.store.db_path = PathBuf::from(db_path);
        }

        if let Ok(max_players) = env::var("SKIRMISH_MATCHES_MAX_PLAYERS") {
            config.matches.max_players = max_players
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid max players: {}", e)))?;
        }

        if let Ok(ttl) = env::var("SKIRMISH_ROSTER_IDLE_SESSION_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid roster TTL: {}", e)))?;
            config.roster.idle_session_ttl = Duration::from_secs(secs);
        }

        if let Ok(level) = env::var("SKIRMISH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("SKIRMISH_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.matches.max_players == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_players must be greater than 0".to_string(),
            ));
        }

        if self.matches.max_title_len == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_title_len must be greater than 0".to_string(),
            ));
        }

        if self.roster.idle_session_ttl.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "idle_session_ttl must be greater than 0".to_string(),
            ));
        }

        if self.roster.eviction_interval.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "eviction_interval must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }
}
