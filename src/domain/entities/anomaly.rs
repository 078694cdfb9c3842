use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::traffic::{TrafficMetrics, TrafficSample};
use crate::domain::value_objects::anomaly_kind::{AnomalyType, TrendDirection};
use crate::domain::value_objects::metric::Metric;

/// Classification of one sample against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub anomaly_type: Option<AnomalyType>,
    /// Subset of the volume metrics, in evaluation order
    pub anomalous_metrics: Vec<Metric>,
    /// Largest standard-deviation distance among anomalous metrics, 0 if none
    pub deviation: f64,
    /// 0–100
    pub confidence: f64,
    pub description: String,
}

/// Side-by-side view of a sample and the baseline it is measured against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub current: TrafficMetrics,
    pub baseline: TrafficMetrics,
    /// Percentage change relative to the baseline mean
    pub change_rate: TrafficMetrics,
    /// Signed distance from the mean in standard deviations
    pub deviation: TrafficMetrics,
    pub anomaly_detection: AnomalyResult,
}

/// An anomalous sample from a batch, paired with its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnomaly {
    pub sample: TrafficSample,
    pub result: AnomalyResult,
}

/// A sudden level shift in a page-view series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEvent {
    pub trend: TrendDirection,
    /// Index of the first sample after the shift
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub mean_before: f64,
    pub mean_after: f64,
    /// `(mean_after - mean_before) / mean_before`
    pub magnitude: f64,
}
