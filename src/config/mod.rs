//! Configuration management for Plaza.
//!
//! Configuration is read from `~/.config/plaza/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub listing: ListingConfig,
}

/// Where the REST backend lives and how to talk to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 10,
            user_agent: format!("plaza/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched listing page is served without asking the server again.
    pub content_ttl_secs: i64,
    /// Lifetime of cached favorite status and counts.
    pub favorite_ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            content_ttl_secs: crate::coordinator::DEFAULT_CONTENT_TTL_SECS,
            favorite_ttl_secs: crate::favorites::DEFAULT_FAVORITE_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn content_ttl(&self) -> Duration {
        Duration::seconds(self.content_ttl_secs.max(0))
    }

    pub fn favorite_ttl(&self) -> Duration {
        Duration::seconds(self.favorite_ttl_secs.max(0))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub per_page: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            per_page: crate::coordinator::DEFAULT_PER_PAGE,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/plaza/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("plaza").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    fn default_config_content() -> String {
        r##"# Plaza Configuration

[api]
# Base URL of the REST backend, including the /api prefix
base_url = "http://localhost:8000/api"

# Request timeout in seconds
timeout_secs = 10

# User-Agent header sent with every request
# user_agent = "plaza/0.1.0"

[cache]
# Seconds a listing page is reused before it is fetched again
content_ttl_secs = 300

# Seconds favorite status and counts are reused
favorite_ttl_secs = 60

[listing]
# Posts per page
per_page = 10
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.content_ttl(), Duration::minutes(5));
        assert_eq!(config.cache.favorite_ttl(), Duration::seconds(60));
        assert_eq!(config.listing.per_page, 10);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[api]
base_url = "https://plaza.example/api"

[listing]
per_page = 6
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.api.base_url, "https://plaza.example/api");
        assert_eq!(config.listing.per_page, 6);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.content_ttl_secs, 300);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
        assert!(config.api.user_agent.starts_with("plaza/"));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plaza").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.listing.per_page, 10);
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.cache.favorite_ttl_secs, 60);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[listing]\nper_page = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
