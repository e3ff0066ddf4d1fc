/*
[INPUT]:  SettingsStore backend
[OUTPUT]: RefreshConfig load/save with in-memory fallback, interval presets
[POS]:    Persistence layer - the only durable state of the refresh pipeline
[UPDATE]: When changing the persisted record format or preset list
*/

pub mod store;

pub use store::{JsonFileStore, MemoryStore, SettingsStore};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Key the refresh record is stored under.
pub const SETTINGS_KEY: &str = "valar_refresh_settings";

pub const DEFAULT_ENABLED: bool = true;
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

/// Persisted auto-refresh configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(rename = "isEnabled", default = "default_enabled")]
    pub enabled: bool,
    #[serde(rename = "interval", default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl RefreshConfig {
    /// The timer runs only in this state.
    pub fn should_arm(&self) -> bool {
        self.enabled && self.interval_ms > 0
    }
}

fn default_enabled() -> bool {
    DEFAULT_ENABLED
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// Read the stored record, falling back to defaults on any failure.
pub fn load_config(store: &dyn SettingsStore) -> RefreshConfig {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return RefreshConfig::default(),
        Err(err) => {
            warn!(error = %err, "failed to load refresh settings; using defaults");
            return RefreshConfig::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "stored refresh settings are invalid; using defaults");
            RefreshConfig::default()
        }
    }
}

/// Overwrite the stored record. Failures are logged and otherwise ignored.
pub fn save_config(store: &dyn SettingsStore, config: &RefreshConfig) {
    let serialized = match serde_json::to_string(config) {
        Ok(serialized) => serialized,
        Err(err) => {
            warn!(error = %err, "failed to serialize refresh settings");
            return;
        }
    };

    if let Err(err) = store.set(SETTINGS_KEY, &serialized) {
        warn!(error = %err, "failed to save refresh settings");
    }
}

/// A selectable refresh interval for the interval picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPreset {
    pub interval_ms: u64,
    pub label: &'static str,
}

pub const INTERVAL_PRESETS: [IntervalPreset; 13] = [
    IntervalPreset { interval_ms: 1_000, label: "1s" },
    IntervalPreset { interval_ms: 5_000, label: "5s" },
    IntervalPreset { interval_ms: 10_000, label: "10s" },
    IntervalPreset { interval_ms: 30_000, label: "30s" },
    IntervalPreset { interval_ms: 40_000, label: "40s" },
    IntervalPreset { interval_ms: 50_000, label: "50s" },
    IntervalPreset { interval_ms: 60_000, label: "1min" },
    IntervalPreset { interval_ms: 120_000, label: "2min" },
    IntervalPreset { interval_ms: 180_000, label: "3min" },
    IntervalPreset { interval_ms: 300_000, label: "5min" },
    IntervalPreset { interval_ms: 600_000, label: "10min" },
    IntervalPreset { interval_ms: 900_000, label: "15min" },
    IntervalPreset { interval_ms: 1_800_000, label: "30min" },
];

/// Label for an interval; non-preset values are rendered in milliseconds.
pub fn interval_label(interval_ms: u64) -> String {
    INTERVAL_PRESETS
        .iter()
        .find(|preset| preset.interval_ms == interval_ms)
        .map(|preset| preset.label.to_string())
        .unwrap_or_else(|| format!("{interval_ms}ms"))
}
