//! Configuration management
//!
//! Store connection settings and retry policy, loaded from a TOML file and
//! overlaid with environment variables. Values are accepted as-is: a missing
//! bucket or credential surfaces later as a store-call failure.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "WSP_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Object store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket holding both templates and workspaces
    pub bucket: String,

    /// Endpoint override for non-default regions or S3-compatible stores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    pub region: String,

    pub access_key: String,

    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Use path-style addressing (required by most S3-compatible servers)
    pub force_path_style: bool,

    /// Upper bound on keys per listing page; store default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_keys: Option<i32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: false,
            max_keys: None,
        }
    }
}

/// Retry policy for listing requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub retry: RetryConfig,
}

impl Config {
    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Overlay values from an arbitrary variable lookup
    ///
    /// Recognized names: `S3_BUCKET`, `S3_ENDPOINT`, `AWS_REGION`,
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`. Empty values are ignored.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(bucket) = get("S3_BUCKET") {
            self.store.bucket = bucket;
        }
        if let Some(endpoint) = get("S3_ENDPOINT") {
            self.store.endpoint = Some(endpoint);
        }
        if let Some(region) = get("AWS_REGION") {
            self.store.region = region;
        }
        if let Some(access_key) = get("AWS_ACCESS_KEY_ID") {
            self.store.access_key = access_key;
        }
        if let Some(secret_key) = get("AWS_SECRET_ACCESS_KEY") {
            self.store.secret_key = secret_key;
        }
    }
}

/// Locates, reads and writes the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a manager rooted at `$WSP_CONFIG_DIR` or the platform config dir
    pub fn new() -> Result<Self> {
        let dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .map(|d| d.join("wsp"))
                .ok_or_else(|| {
                    crate::Error::Config("Cannot determine config directory".to_string())
                })?,
        };
        Ok(Self::with_dir(dir))
    }

    /// Create a manager rooted at an explicit directory
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration file; a missing file yields defaults
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
