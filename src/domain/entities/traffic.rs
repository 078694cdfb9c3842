use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::metric::Metric;
use crate::domain::value_objects::platform::Platform;

/// Samples scoring below this are considered low quality by collectors.
pub const LOW_QUALITY_SCORE: u8 = 30;

/// The five traffic metrics, one value each.
///
/// Also reused for per-metric statistics (means, standard deviations,
/// change rates) so every consumer indexes metrics the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficMetrics {
    pub page_views: f64,
    pub unique_visitors: f64,
    pub sessions: f64,
    /// Seconds
    pub avg_session_duration: f64,
    /// Percentage (0–100)
    pub bounce_rate: f64,
}

impl TrafficMetrics {
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PageViews => self.page_views,
            Metric::UniqueVisitors => self.unique_visitors,
            Metric::Sessions => self.sessions,
            Metric::AvgSessionDuration => self.avg_session_duration,
            Metric::BounceRate => self.bounce_rate,
        }
    }

    /// Builds a metric set by evaluating `f` once per metric.
    pub fn from_fn(mut f: impl FnMut(Metric) -> f64) -> Self {
        Self {
            page_views: f(Metric::PageViews),
            unique_visitors: f(Metric::UniqueVisitors),
            sessions: f(Metric::Sessions),
            avg_session_duration: f(Metric::AvgSessionDuration),
            bounce_rate: f(Metric::BounceRate),
        }
    }

    /// Clamps counts and duration to `>= 0` and the bounce rate to `[0, 100]`.
    ///
    /// NaN inputs are treated as zero.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let non_negative = |v: f64| if v.is_nan() { 0.0 } else { v.max(0.0) };
        Self {
            page_views: non_negative(self.page_views),
            unique_visitors: non_negative(self.unique_visitors),
            sessions: non_negative(self.sessions),
            avg_session_duration: non_negative(self.avg_session_duration),
            bounce_rate: non_negative(self.bounce_rate).min(100.0),
        }
    }
}

/// A standardized traffic observation for one platform at one point in time.
///
/// Build it with [`TrafficSample::new`] (or from a [`RawTrafficRecord`]) so
/// metric values are always within their valid ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub platform: Platform,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: TrafficMetrics,
    /// 0–100, absent on aggregated samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    #[serde(default)]
    pub is_anomaly: bool,
}

impl TrafficSample {
    /// Standardizes `metrics` and scores the resulting sample.
    #[must_use]
    pub fn new(platform: Platform, timestamp: DateTime<Utc>, metrics: TrafficMetrics) -> Self {
        let metrics = metrics.clamped();
        Self {
            platform,
            timestamp,
            quality_score: Some(quality_score(&metrics)),
            metrics,
            is_anomaly: false,
        }
    }

    #[must_use]
    pub const fn with_anomaly_flag(mut self, is_anomaly: bool) -> Self {
        self.is_anomaly = is_anomaly;
        self
    }

    #[must_use]
    pub const fn value(&self, metric: Metric) -> f64 {
        self.metrics.get(metric)
    }

    #[must_use]
    pub fn is_low_quality(&self) -> bool {
        self.quality_score.is_some_and(|s| s < LOW_QUALITY_SCORE)
    }
}

/// Scores completeness and plausibility of a clamped metric set.
#[allow(clippy::float_cmp)]
fn quality_score(m: &TrafficMetrics) -> u8 {
    let mut score: i32 = 100;

    if m.page_views == 0.0 {
        score -= 20;
    }
    if m.unique_visitors == 0.0 {
        score -= 20;
    }
    if m.sessions == 0.0 {
        score -= 20;
    }

    if m.unique_visitors > m.page_views {
        score -= 15;
    }
    if m.sessions > m.page_views {
        score -= 15;
    }
    if m.bounce_rate == 0.0 || m.bounce_rate == 100.0 {
        score -= 10;
    }

    u8::try_from(score.max(0)).unwrap_or(0)
}

/// Unvalidated record as delivered by a data source, before standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrafficRecord {
    pub platform: Platform,
    pub timestamp: DateTime<Utc>,
    pub page_views: f64,
    pub unique_visitors: f64,
    pub sessions: f64,
    #[serde(default)]
    pub avg_session_duration: f64,
    #[serde(default)]
    pub bounce_rate: f64,
    #[serde(default)]
    pub is_anomaly: bool,
}

impl From<RawTrafficRecord> for TrafficSample {
    fn from(raw: RawTrafficRecord) -> Self {
        Self::new(
            raw.platform,
            raw.timestamp,
            TrafficMetrics {
                page_views: raw.page_views,
                unique_visitors: raw.unique_visitors,
                sessions: raw.sessions,
                avg_session_duration: raw.avg_session_duration,
                bounce_rate: raw.bounce_rate,
            },
        )
        .with_anomaly_flag(raw.is_anomaly)
    }
}

/// Totals and averages of one platform's non-anomalous traffic over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub platform: Platform,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_page_views: f64,
    pub total_unique_visitors: f64,
    pub total_sessions: f64,
    pub avg_session_duration: f64,
    pub avg_bounce_rate: f64,
    pub data_points: usize,
}

impl TrafficSummary {
    /// Summarizes `samples`, skipping those flagged as anomalies.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(
        platform: Platform,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        samples: &[TrafficSample],
    ) -> Self {
        let normal: Vec<&TrafficSample> = samples.iter().filter(|s| !s.is_anomaly).collect();
        let data_points = normal.len();
        let total = |metric: Metric| normal.iter().map(|s| s.value(metric)).sum::<f64>();
        let average = |metric: Metric| {
            if data_points == 0 {
                0.0
            } else {
                total(metric) / data_points as f64
            }
        };

        Self {
            platform,
            period_start,
            period_end,
            total_page_views: total(Metric::PageViews),
            total_unique_visitors: total(Metric::UniqueVisitors),
            total_sessions: total(Metric::Sessions),
            avg_session_duration: average(Metric::AvgSessionDuration),
            avg_bounce_rate: average(Metric::BounceRate),
            data_points,
        }
    }
}
