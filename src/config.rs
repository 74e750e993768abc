use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pagelink: PagelinkConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Tool-wide settings
#[derive(Debug, Clone, Deserialize)]
pub struct PagelinkConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for PagelinkConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Workspace API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root of the workspace API, e.g. `https://api.example.com/v1/`
    pub base_url: String,
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

/// Graph engine bounds
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_depth")]
    pub default_depth: usize,
    /// Single-page bound for each candidate collection during backlink
    /// resolution. Larger collections are under-reported; raising this
    /// trades requests for coverage.
    #[serde(default = "default_collection_page_size")]
    pub collection_page_size: usize,
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            collection_page_size: default_collection_page_size(),
            search_page_size: default_search_page_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_token_env() -> String {
    "PAGELINK_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_depth() -> usize {
    2
}

fn default_collection_page_size() -> usize {
    100
}

fn default_search_page_size() -> usize {
    50
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in PAGELINK_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("PAGELINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        std::env::var(&self.api.api_token_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your workspace API token.",
                self.api.api_token_env
            )
        })?;

        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }

        if self.graph.collection_page_size == 0 {
            anyhow::bail!("graph.collection_page_size must be greater than 0");
        }

        if self.graph.search_page_size == 0 {
            anyhow::bail!("graph.search_page_size must be greater than 0");
        }

        Ok(())
    }

    /// Resolve the API token from the configured environment variable.
    pub fn api_token(&self) -> Result<String> {
        std::env::var(&self.api.api_token_env)
            .with_context(|| format!("Environment variable {} not set", self.api.api_token_env))
    }
}
