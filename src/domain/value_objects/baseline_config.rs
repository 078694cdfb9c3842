use serde::{Deserialize, Serialize};

use super::baseline_mode::BaselineMode;

/// Tuning knobs for baseline computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Aggregation mode used when the caller does not pick one
    #[serde(default)]
    pub mode: BaselineMode,
    /// Fewer samples than this produce no baseline
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
    /// `k` in `mean ± k·stddev` for the stored anomaly thresholds
    #[serde(default = "default_threshold_multiplier")]
    pub anomaly_threshold_multiplier: f64,
    /// Drop IQR outliers (by page views) before computing statistics
    #[serde(default = "default_exclude_outliers")]
    pub exclude_outliers: bool,
    /// Stored as a fraction, reported on baselines as a percentage
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

const fn default_min_sample_size() -> usize {
    7
}

const fn default_threshold_multiplier() -> f64 {
    2.0
}

const fn default_exclude_outliers() -> bool {
    true
}

const fn default_confidence_level() -> f64 {
    0.95
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            mode: BaselineMode::default(),
            min_sample_size: default_min_sample_size(),
            anomaly_threshold_multiplier: default_threshold_multiplier(),
            exclude_outliers: default_exclude_outliers(),
            confidence_level: default_confidence_level(),
        }
    }
}

impl BaselineConfig {
    /// Returns a copy with out-of-range values pulled back into their valid domain.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            mode: self.mode,
            min_sample_size: self.min_sample_size.max(1),
            anomaly_threshold_multiplier: if self.anomaly_threshold_multiplier.is_finite() {
                self.anomaly_threshold_multiplier.max(0.0)
            } else {
                default_threshold_multiplier()
            },
            exclude_outliers: self.exclude_outliers,
            confidence_level: if self.confidence_level.is_finite() {
                self.confidence_level.clamp(0.0, 1.0)
            } else {
                default_confidence_level()
            },
        }
    }

    /// Shallow-merges every field set in `update`; unset fields keep their value.
    pub fn apply(&mut self, update: &BaselineConfigUpdate) {
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(min) = update.min_sample_size {
            self.min_sample_size = min;
        }
        if let Some(k) = update.anomaly_threshold_multiplier {
            self.anomaly_threshold_multiplier = k;
        }
        if let Some(exclude) = update.exclude_outliers {
            self.exclude_outliers = exclude;
        }
        if let Some(level) = update.confidence_level {
            self.confidence_level = level;
        }
    }
}

/// Partial [`BaselineConfig`]: `None` fields are left untouched on merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<BaselineMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sample_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_outliers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
}
