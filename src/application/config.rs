use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::services::collection::RetryPolicy;
use crate::domain::value_objects::baseline_config::BaselineConfig;

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Trend detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_trend_window")]
    pub trend_window_size: usize,
}

/// Retry, timeout and batching applied around every traffic source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_min_quality")]
    pub min_quality_score: u8,
}

/// Database storage path (tilde-expanded at point of use).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

/// Sections included in the traffic report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,
    #[serde(default = "default_true")]
    pub include_anomalies: bool,
    #[serde(default = "default_true")]
    pub include_baseline: bool,
    #[serde(default = "default_true")]
    pub include_recommendations: bool,
}

// --- Defaults ---

const fn default_trend_window() -> usize {
    3
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay() -> u64 {
    1000
}

const fn default_timeout() -> u64 {
    30_000
}

const fn default_batch_size() -> usize {
    100
}

const fn default_min_quality() -> u8 {
    30
}

// NOTE: Stored with a leading tilde, expanded by shellexpand at point of use.
fn default_database_path() -> String {
    "~/.local/share/trafficwatch/trafficwatch.db".into()
}

const fn default_retention_days() -> u32 {
    365
}

fn default_report_title() -> String {
    "Platform Traffic Report".into()
}

const fn default_true() -> bool {
    true
}

// --- Default impls ---

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            trend_window_size: default_trend_window(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            timeout_ms: default_timeout(),
            batch_size: default_batch_size(),
            min_quality_score: default_min_quality(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            retention_days: default_retention_days(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
            include_anomalies: true,
            include_baseline: true,
            include_recommendations: true,
        }
    }
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load config from default path or create default config file
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the file cannot be read, or the TOML content is invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_or_create(&path)
    }

    /// Load from a specific path, or create a default config file if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is invalid,
    /// or the default config file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to a specific path, creating parent directories if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("trafficwatch").join("config.toml"))
    }
}

impl From<&CollectorConfig> for RetryPolicy {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            // a zero timeout would fail every attempt
            timeout: Duration::from_millis(config.timeout_ms.max(1)),
            batch_size: config.batch_size.max(1),
            min_quality_score: config.min_quality_score.min(100),
        }
    }
}
