use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::traffic::TrafficMetrics;
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::metric::Metric;
use crate::domain::value_objects::platform::Platform;

/// One value per volume metric (page views, unique visitors, sessions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetrics {
    pub page_views: f64,
    pub unique_visitors: f64,
    pub sessions: f64,
}

impl VolumeMetrics {
    /// Returns `None` for metrics that are not volume metrics.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::PageViews => Some(self.page_views),
            Metric::UniqueVisitors => Some(self.unique_visitors),
            Metric::Sessions => Some(self.sessions),
            Metric::AvgSessionDuration | Metric::BounceRate => None,
        }
    }
}

/// Band outside of which a volume metric is considered anomalous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThresholds {
    /// `mean + k·stddev`
    pub upper: VolumeMetrics,
    /// `max(0, mean - k·stddev)`
    pub lower: VolumeMetrics,
}

impl AnomalyThresholds {
    /// Derives the band for `k` standard deviations around each mean.
    #[must_use]
    pub fn from_stats(mean: &TrafficMetrics, stddev: &TrafficMetrics, k: f64) -> Self {
        let upper = |m: Metric| mean.get(m) + k * stddev.get(m);
        let lower = |m: Metric| (mean.get(m) - k * stddev.get(m)).max(0.0);
        Self {
            upper: VolumeMetrics {
                page_views: upper(Metric::PageViews),
                unique_visitors: upper(Metric::UniqueVisitors),
                sessions: upper(Metric::Sessions),
            },
            lower: VolumeMetrics {
                page_views: lower(Metric::PageViews),
                unique_visitors: lower(Metric::UniqueVisitors),
                sessions: lower(Metric::Sessions),
            },
        }
    }
}

/// Time range covered by the samples a baseline was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselinePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Statistical reference for one platform and aggregation mode.
///
/// A baseline is never mutated once computed; a newer one supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub platform: Platform,
    pub mode: BaselineMode,
    pub period: BaselinePeriod,
    /// Per-metric mean
    pub values: TrafficMetrics,
    /// Per-metric population standard deviation
    pub standard_deviation: TrafficMetrics,
    pub anomaly_threshold: AnomalyThresholds,
    pub sample_size: usize,
    /// Percentage (e.g. 95.0)
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Baseline {
    #[must_use]
    pub const fn mean(&self, metric: Metric) -> f64 {
        self.values.get(metric)
    }

    #[must_use]
    pub const fn stddev(&self, metric: Metric) -> f64 {
        self.standard_deviation.get(metric)
    }
}
