//! Server configuration.
//!
//! Loads and validates configuration from a YAML file or environment variables.

use d2v_index::{DuplicatePolicy, LoadOptions};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
///
/// Example YAML:
/// ```yaml
/// vectors_path: "/var/lib/d2v/doc2vec.csv"
/// http_addr: "0.0.0.0:7480"
/// query_timeout_ms: 5000
/// default_page_size: 10
/// max_page_size: 100
/// duplicates: reject
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// CSV file with one `id,v1,...,vD` row per document
    pub vectors_path: PathBuf,

    /// HTTP listen address
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Queries still running after this long are cancelled
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Page size used when a request doesn't give one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Largest page a single request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Handling of repeated ids in the vectors file
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

fn default_http_addr() -> String {
    "0.0.0.0:7480".to_string()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

impl ServerConfig {
    /// Configuration with defaults for everything but the vectors file.
    pub fn new(vectors_path: impl Into<PathBuf>) -> Self {
        Self {
            vectors_path: vectors_path.into(),
            http_addr: default_http_addr(),
            query_timeout_ms: default_query_timeout_ms(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            duplicates: DuplicatePolicy::default(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Supported variables:
    /// - D2V_VECTORS_PATH (required)
    /// - D2V_HTTP_ADDR
    /// - D2V_QUERY_TIMEOUT_MS
    /// - D2V_DEFAULT_PAGE_SIZE
    /// - D2V_MAX_PAGE_SIZE
    /// - D2V_DUPLICATES (`reject` or `last_wins`)
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let vectors_path = std::env::var("D2V_VECTORS_PATH")
            .map_err(|_| ConfigError::MissingField("D2V_VECTORS_PATH".to_string()))?;

        let mut config = ServerConfig::new(vectors_path);

        if let Ok(addr) = std::env::var("D2V_HTTP_ADDR") {
            config.http_addr = addr;
        }
        if let Some(ms) = env_parsed("D2V_QUERY_TIMEOUT_MS")? {
            config.query_timeout_ms = ms;
        }
        if let Some(size) = env_parsed("D2V_DEFAULT_PAGE_SIZE")? {
            config.default_page_size = size;
        }
        if let Some(size) = env_parsed("D2V_MAX_PAGE_SIZE")? {
            config.max_page_size = size;
        }
        if let Some(policy) = env_parsed("D2V_DUPLICATES")? {
            config.duplicates = policy;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vectors_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidField(
                "vectors_path cannot be empty".to_string(),
            ));
        }

        self.http_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidField(format!("Invalid http_addr: {}", e)))?;

        if self.query_timeout_ms == 0 {
            return Err(ConfigError::InvalidField(
                "query_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.max_page_size == 0 {
            return Err(ConfigError::InvalidField(
                "max_page_size must be > 0".to_string(),
            ));
        }

        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidField(format!(
                "default_page_size must be in 1..={}",
                self.max_page_size
            )));
        }

        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::default().with_duplicates(self.duplicates)
    }
}

/// Parse an optional environment variable.
fn env_parsed<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidField(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}
