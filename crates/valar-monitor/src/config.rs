/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed monitor configuration with per-field defaults
[POS]:    Configuration layer - API access, account selection, highlight tuning
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use valar_refresh::value_change::DEFAULT_PRECISION;
use valar_refresh::{HighlightTimings, JsonFileStore, Route};

use crate::api::ClientConfig;

/// Top-level configuration for the dashboard monitor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Accounts shown on every page; empty means none selected
    #[serde(default)]
    pub accounts: Vec<String>,
    /// Path of the page shown at startup
    #[serde(default = "default_start_page")]
    pub start_page: String,
    /// Refresh settings file; defaults to the user config dir
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
    #[serde(default)]
    pub highlight: HighlightConfig,
    /// Trade date for the orders page (YYYYMMDD); asks the server when unset
    #[serde(default)]
    pub trade_date: Option<String>,
    /// Re-print the current page on every view change
    #[serde(default = "default_render_on_change")]
    pub render_on_change: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            accounts: Vec::new(),
            start_page: default_start_page(),
            settings_path: None,
            highlight: HighlightConfig::default(),
            trade_date: None,
            render_on_change: default_render_on_change(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HighlightConfig {
    /// Decimal places compared when classifying a change
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(flatten)]
    pub timings: HighlightTimings,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            timings: HighlightTimings::default(),
        }
    }
}

fn default_start_page() -> String {
    Route::Dashboard.path().to_string()
}

fn default_base_url() -> String {
    ClientConfig::default().base_url
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_precision() -> u32 {
    DEFAULT_PRECISION
}

fn default_render_on_change() -> bool {
    true
}

impl MonitorConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn start_route(&self) -> Route {
        Route::from_path(&self.start_page)
    }

    pub fn client_config(&self) -> ClientConfig {
        let timeout = Duration::from_secs(self.api.timeout_secs);
        ClientConfig {
            base_url: self.api.base_url.clone(),
            token: self.api.token.clone(),
            timeout,
            connect_timeout: timeout.min(ClientConfig::default().connect_timeout),
        }
    }

    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_path
            .clone()
            .or_else(|| JsonFileStore::default_path().ok())
    }
}
