//! Configuration management for newsreel.
//!
//! Configuration is read from `~/.config/newsreel/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::browser::BrowserConfig;
use crate::domain::Source;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub pipeline: PipelineConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Staging artifact; defaults to the data directory
    pub staging_path: Option<PathBuf>,

    /// Article database; defaults to the data directory
    pub database_path: Option<PathBuf>,

    /// Skip links the store already holds while crawling
    pub seed_from_store: bool,

    /// Merge the staging artifact at the end of `crawl`
    pub merge_after_crawl: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            staging_path: None,
            database_path: None,
            seed_from_store: false,
            merge_after_crawl: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Sources to crawl, in order
    pub enabled: Vec<Source>,

    /// Overrides each source's per-page cap on accepted articles
    pub max_per_page: Option<usize>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: Source::ALL.to_vec(),
            max_per_page: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/newsreel/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsreel").join("config.toml"))
    }

    /// Data directory for the database and staging files: `~/.local/share/newsreel`
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("newsreel"))
    }

    pub fn staging_path(&self) -> Result<PathBuf, ConfigError> {
        match self.pipeline.staging_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("staging").join("all_news_data.csv")),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match self.pipeline.database_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("newsreel.db")),
        }
    }

    /// Create a default config file with comments.
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
            })?;

        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# newsreel configuration
#
# Sources: bbc, global, guardian, cbc, nytimes

[browser]
# Run browser in headless mode (no visible window)
headless = true

# Chrome/Chromium executable (auto-detected when unset)
# chrome_path = "/usr/bin/chromium"

# Page load timeout in seconds
navigation_timeout_secs = 30

# How long to wait for article elements on a page, in seconds
wait_timeout_secs = 15

# Wait time after page load for dynamic content (milliseconds)
wait_after_load_ms = 2000

# How long to look for a cookie/consent prompt (milliseconds)
consent_timeout_ms = 5000

# Connect to an already running browser instead of launching one
# (NEWSREEL_BROWSER_URL overrides this)
# remote_url = "http://localhost:9222"

# Connection attempts and pause between them when remote_url is set
connect_attempts = 10
connect_retry_ms = 2000

[pipeline]
# Staging artifact, rewritten on every crawl
# staging_path = "/tmp/all_news_data.csv"

# Article database
# database_path = "/var/lib/newsreel/newsreel.db"

# Skip articles already in the database while crawling
seed_from_store = false

# Merge staged articles into the database when a crawl finishes
merge_after_crawl = true

[sources]
# Sources to crawl, in order
enabled = ["bbc", "global", "guardian", "cbc", "nytimes"]

# Cap on new articles taken from each page (per-source defaults when unset)
# max_per_page = 60
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Could not determine data directory")]
    NoDataDir,

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
