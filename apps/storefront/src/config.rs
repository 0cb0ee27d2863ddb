//! # Configuration
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BARKAS_*`)
//! 2. Config file (`BARKAS_CONFIG`, else `<platform config dir>/config.toml`)
//! 3. Defaults (this file)
//!
//! ## Example `config.toml`
//! ```toml
//! [server]
//! port = 8080
//!
//! [auth]
//! jwt_secret = "change-me"
//!
//! [store]
//! low_stock_threshold = 5
//! ```

use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Secret used when nothing else is configured. Startup warns about it.
pub const DEV_JWT_SECRET: &str = "barkas-dev-secret-change-in-production";

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// A visitor's cookie, cart and sign-in are dropped after this much
    /// inactivity.
    pub visitor_idle_secs: i64,
    /// Marks the visitor cookie `Secure` (HTTPS deployments).
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            visitor_idle_secs: 7 * 24 * 60 * 60,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    /// Database in the platform data directory:
    /// - **macOS**: `~/Library/Application Support/id.barkasbali88.storefront/barkas.db`
    /// - **Linux**: `~/.local/share/storefront/barkas.db`
    fn default() -> Self {
        let path = project_dirs()
            .map(|dirs| dirs.data_dir().join("barkas.db"))
            .unwrap_or_else(|| PathBuf::from("barkas.db"));

        DatabaseConfig {
            path,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub session_lifetime_secs: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_lifetime_secs: 8 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store name shown by the API.
    pub name: String,
    /// Products with `stock < threshold` count as low stock on the dashboard.
    pub low_stock_threshold: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: "BarkasBali88".to_string(),
            low_stock_threshold: barkas_core::LOW_STOCK_THRESHOLD,
        }
    }
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Loads defaults, then the config file, then `BARKAS_*` variables,
    /// and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var_os("BARKAS_CONFIG") {
            // An explicit path must exist
            Some(path) => Self::from_file(Path::new(&path))?,
            None => match project_dirs().map(|d| d.config_dir().join("config.toml")) {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => AppConfig::default(),
            },
        };

        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `BARKAS_HOST`, `BARKAS_PORT`
    /// - `BARKAS_VISITOR_IDLE_SECS`, `BARKAS_SECURE_COOKIES`
    /// - `BARKAS_DB_PATH`, `BARKAS_DB_MAX_CONNECTIONS`
    /// - `BARKAS_JWT_SECRET`, `BARKAS_SESSION_LIFETIME_SECS`
    /// - `BARKAS_STORE_NAME`, `BARKAS_LOW_STOCK_THRESHOLD`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BARKAS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BARKAS_PORT") {
            self.server.port = parse_var("BARKAS_PORT", &port)?;
        }
        if let Some(secs) = lookup("BARKAS_VISITOR_IDLE_SECS") {
            self.server.visitor_idle_secs = parse_var("BARKAS_VISITOR_IDLE_SECS", &secs)?;
        }
        if let Some(secure) = lookup("BARKAS_SECURE_COOKIES") {
            self.server.secure_cookies = parse_var("BARKAS_SECURE_COOKIES", &secure)?;
        }
        if let Some(path) = lookup("BARKAS_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = lookup("BARKAS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("BARKAS_DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(secret) = lookup("BARKAS_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(secs) = lookup("BARKAS_SESSION_LIFETIME_SECS") {
            self.auth.session_lifetime_secs = parse_var("BARKAS_SESSION_LIFETIME_SECS", &secs)?;
        }
        if let Some(name) = lookup("BARKAS_STORE_NAME") {
            self.store.name = name;
        }
        if let Some(threshold) = lookup("BARKAS_LOW_STOCK_THRESHOLD") {
            self.store.low_stock_threshold = parse_var("BARKAS_LOW_STOCK_THRESHOLD", &threshold)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".to_string()));
        }
        if self.server.visitor_idle_secs <= 0 {
            return Err(ConfigError::Invalid(
                "server.visitor_idle_secs must be positive".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".to_string()));
        }
        if self.auth.session_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "auth.session_lifetime_secs must be positive".to_string(),
            ));
        }
        if self.store.low_stock_threshold < 0 {
            return Err(ConfigError::Invalid(
                "store.low_stock_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// True when the built-in development secret is still in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("id", "barkasbali88", "storefront")
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
