use std::path::PathBuf;
use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::store::surreal::SurrealStoreConfig;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
pub struct AppConfig {
    #[garde(dive)]
    #[serde(default)]
    pub server: ServerConfig,

    #[garde(dive)]
    #[serde(default)]
    pub logging: LoggingConfig,

    #[garde(dive)]
    #[serde(default)]
    pub cache: CacheSettings,

    #[garde(dive)]
    #[serde(default)]
    pub store: StoreConfig,

    #[garde(skip)]
    #[serde(default)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[garde(range(min = 1024, max = 65535))]
    pub port: u16,

    #[garde(length(min = 1), custom(validate_bind_address))]
    #[serde(default = "default_bind")]
    pub bind: String,

    #[garde(range(min = 1, max = 300))]
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64, // seconds
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind: default_bind(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    #[garde(length(min = 1))]
    #[serde(default = "default_log_level")]
    pub level: String, // trace, debug, info, warn, error

    #[garde(pattern(r"^(json|pretty)$"))]
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// TTLs and limits for the profile and role caches
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CacheSettings {
    #[garde(range(min = 1, max = 86400))]
    #[serde(default = "default_ttl_seconds")]
    pub profile_ttl_seconds: u64,

    #[garde(range(min = 1, max = 86400))]
    #[serde(default = "default_ttl_seconds")]
    pub role_ttl_seconds: u64,

    #[garde(range(min = 1, max = 3600))]
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Per cache, not shared between them
    #[garde(range(min = 1, max = 1_000_000))]
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_ttl_seconds() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            profile_ttl_seconds: default_ttl_seconds(),
            role_ttl_seconds: default_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheSettings {
    pub fn profile_cache(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.profile_ttl_seconds),
            max_entries: self.max_entries,
        }
    }

    pub fn role_cache(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.role_ttl_seconds),
            max_entries: self.max_entries,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StoreConfig {
    #[garde(pattern(r"^(memory|surreal)$"))]
    #[serde(default = "default_backend")]
    pub backend: String,

    #[garde(length(min = 1))]
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[garde(length(min = 1))]
    #[serde(default = "default_database")]
    pub database: String,

    /// JSON document loaded into the store at startup
    #[garde(skip)]
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_namespace() -> String {
    SurrealStoreConfig::default().namespace
}

fn default_database() -> String {
    SurrealStoreConfig::default().database
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            namespace: default_namespace(),
            database: default_database(),
            seed_file: None,
        }
    }
}

impl StoreConfig {
    pub fn surreal(&self) -> SurrealStoreConfig {
        SurrealStoreConfig {
            namespace: self.namespace.clone(),
            database: self.database.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

fn validate_bind_address(value: &str, _: &()) -> garde::Result {
    value
        .parse::<std::net::IpAddr>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid IP address"))
}
