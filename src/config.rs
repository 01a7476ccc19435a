use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Origin the `/api/v1` prefix is appended to
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Transport timeout in seconds; unset leaves it to the HTTP client
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

fn default_api_base_url() -> String {
    "http://localhost:4000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_sec: None,
        }
    }
}

/// Where the session is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// OS keyring, with file fallback
    #[default]
    Keyring,
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Session file path (default: config directory / eatlog / session.json)
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Unauthenticated entry point used on forced logout
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

fn default_login_path() -> String {
    "/".to_string()
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (default: stderr); a directory path, such as one
    /// ending in '/', gets daily rotated `eatlog.log.<date>` files
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    pub fn login_path(&self) -> &str {
        &self.navigation.login_path
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url =
            url::Url::parse(&self.api.base_url).map_err(|e| ConfigError::ValidationError {
                reason: format!("api.base_url '{}' is not a valid URL: {}", self.api.base_url, e),
            })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError {
                reason: format!("api.base_url must use http or https, got '{}'", base_url.scheme()),
            });
        }

        if self.api.timeout_sec == Some(0) {
            return Err(ConfigError::ValidationError {
                reason: "api.timeout_sec must be greater than 0".to_string(),
            });
        }

        if !self.navigation.login_path.starts_with('/') {
            return Err(ConfigError::ValidationError {
                reason: format!(
                    "navigation.login_path must start with '/', got '{}'",
                    self.navigation.login_path
                ),
            });
        }

        Ok(())
    }
}

/// Default config file path
pub fn config_file_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("eatlog");
    path.push("config.toml");
    path
}

/// Load the config from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_file_path())
}

/// Load the config; a missing file yields the defaults
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = if path.exists() {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)?
    } else {
        tracing::debug!("No config file at {:?}, using defaults", path);
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent_dir) = path.parent()
        && !parent_dir.exists()
    {
        fs::create_dir_all(parent_dir).map_err(|e| ConfigError::WriteError { source: e })?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents).map_err(|e| ConfigError::WriteError { source: e })?;
    Ok(())
}
