pub mod anomaly;
pub mod baseline;
pub mod traffic;

pub use anomaly::{AnomalyResult, BaselineComparison, BatchAnomaly, TrendEvent};
pub use baseline::{AnomalyThresholds, Baseline, BaselinePeriod, VolumeMetrics};
pub use traffic::{RawTrafficRecord, TrafficMetrics, TrafficSample, TrafficSummary};
