//! # API Configuration
//!
//! Settings for the back-office server.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌──────────────┐   ┌─────────────────────────┐   ┌──────────────────┐   ┌──────────┐
//! │   defaults   │──►│ celltrack.toml           │──►│ CELLTRACK_* env  │──►│ validate │
//! │              │   │ (or $CELLTRACK_CONFIG)   │   │                  │   │          │
//! └──────────────┘   └─────────────────────────┘   └──────────────────┘   └──────────┘
//! ```
//!
//! ## Environment Variables
//! - `CELLTRACK_CONFIG` - Path of the TOML file
//! - `CELLTRACK_BIND_ADDR`, `CELLTRACK_PORT`
//! - `CELLTRACK_DATABASE_PATH`
//! - `CELLTRACK_JWT_SECRET`, `CELLTRACK_TOKEN_LIFETIME_SECS`
//! - `CELLTRACK_PAGE_SIZE`, `CELLTRACK_LOW_STOCK_THRESHOLD`, `CELLTRACK_STORE_NAME`

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use celltrack_core::report::DEFAULT_LOW_STOCK_THRESHOLD;
use celltrack_core::DEFAULT_PAGE_SIZE;

/// File read when `CELLTRACK_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "celltrack.toml";

/// Secret used when nothing else is configured. Fine for a laptop, never for
/// a shop.
pub const DEV_JWT_SECRET: &str = "celltrack-dev-secret-change-in-production";

const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; created on first start.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/celltrack.db")
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
        }
    }
}

/// Session tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing key.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Access token lifetime (seconds). One shift by default.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: i64,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_lifetime() -> i64 {
    8 * 60 * 60
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: default_jwt_secret(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

/// Shop-level presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Rows per page on inventory, sales and customer lists.
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// A model is low on stock at or below this many available phones.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_store_name() -> String {
    "Celltrack".to_string()
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            page_size: default_page_size(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete API configuration.
///
/// ## Example Config File
/// ```toml
/// [server]
/// bind_addr = "127.0.0.1"
/// port = 8080
///
/// [database]
/// path = "./data/celltrack.db"
///
/// [auth]
/// jwt_secret = "a-long-random-string"
/// token_lifetime_secs = 28800
///
/// [store]
/// name = "Celulares Centro"
/// page_size = 20
/// low_stock_threshold = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl ApiConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Arguments
    /// * `config_path` - Explicit file; falls back to `$CELLTRACK_CONFIG`,
    ///   then `./celltrack.toml`. A missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var_os("CELLTRACK_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            info!(?path, "Loading API config from file");
            let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            Self::from_toml(&contents)?
        } else {
            debug!(?path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        if config.auth.jwt_secret == DEV_JWT_SECRET {
            warn!("Using the development JWT secret; set CELLTRACK_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::invalid("jwt_secret", "must not be empty"));
        }

        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::invalid("token_lifetime_secs", "must be greater than 0"));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.store.page_size) {
            return Err(ConfigError::invalid(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        if self.store.low_stock_threshold < 0 {
            return Err(ConfigError::invalid("low_stock_threshold", "cannot be negative"));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("database.path", "must not be empty"));
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Applies `CELLTRACK_*` environment variables.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup; unset keys leave values alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("CELLTRACK_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("CELLTRACK_PORT") {
            self.server.port = parse_var("CELLTRACK_PORT", &port)?;
            debug!(port = self.server.port, "Overriding port from environment");
        }

        if let Some(path) = lookup("CELLTRACK_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(secret) = lookup("CELLTRACK_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Some(secs) = lookup("CELLTRACK_TOKEN_LIFETIME_SECS") {
            self.auth.token_lifetime_secs = parse_var("CELLTRACK_TOKEN_LIFETIME_SECS", &secs)?;
        }

        if let Some(size) = lookup("CELLTRACK_PAGE_SIZE") {
            self.store.page_size = parse_var("CELLTRACK_PAGE_SIZE", &size)?;
        }

        if let Some(threshold) = lookup("CELLTRACK_LOW_STOCK_THRESHOLD") {
            self.store.low_stock_threshold = parse_var("CELLTRACK_LOW_STOCK_THRESHOLD", &threshold)?;
        }

        if let Some(name) = lookup("CELLTRACK_STORE_NAME") {
            self.store.name = name;
        }

        Ok(())
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.bind_addr, self.server.port)
            .parse()
            .map_err(|e| ConfigError::invalid("bind_addr", format!("{e}")))
    }

    pub fn page_size(&self) -> i64 {
        self.store.page_size
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.store.low_stock_threshold
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.low_stock_threshold(), 5);
        assert_eq!(config.auth.token_lifetime_secs, 28_800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ApiConfig::from_toml(
            r#"
            [server]
            port = 9000

            [store]
            name = "Celulares Centro"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.store.name, "Celulares Centro");
        assert_eq!(config.store.page_size, 20);
        assert_eq!(config.auth.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = ApiConfig::from_toml("[server]\nport = \"ocho mil\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = ApiConfig::from_toml("[server]\nport = 9000").unwrap();
        config
            .apply_overrides(lookup(&[
                ("CELLTRACK_PORT", "7070"),
                ("CELLTRACK_JWT_SECRET", "s3cret"),
                ("CELLTRACK_LOW_STOCK_THRESHOLD", "2"),
                ("CELLTRACK_DATABASE_PATH", "/var/lib/celltrack/shop.db"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.low_stock_threshold(), 2);
        assert_eq!(config.database.path, PathBuf::from("/var/lib/celltrack/shop.db"));
    }

    #[test]
    fn test_unparseable_env_value_is_rejected() {
        let mut config = ApiConfig::default();
        let err = config
            .apply_overrides(lookup(&[("CELLTRACK_PAGE_SIZE", "veinte")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CELLTRACK_PAGE_SIZE"));
    }

    #[test]
    fn test_validation() {
        let mut config = ApiConfig::default();

        config.auth.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());
        config.auth.jwt_secret = "x".to_string();

        config.store.page_size = 0;
        assert!(config.validate().is_err());
        config.store.page_size = 101;
        assert!(config.validate().is_err());
        config.store.page_size = 50;

        config.auth.token_lifetime_secs = 0;
        assert!(config.validate().is_err());
        config.auth.token_lifetime_secs = 60;

        config.server.bind_addr = "not an address".to_string();
        assert!(config.validate().is_err());
        config.server.bind_addr = "127.0.0.1".to_string();

        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }
}
