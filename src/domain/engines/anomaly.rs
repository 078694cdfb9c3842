use crate::domain::entities::anomaly::{AnomalyResult, BaselineComparison, BatchAnomaly, TrendEvent};
use crate::domain::entities::baseline::Baseline;
use crate::domain::entities::traffic::{TrafficMetrics, TrafficSample};
use crate::domain::stats;
use crate::domain::value_objects::anomaly_kind::{AnomalyType, TrendDirection};
use crate::domain::value_objects::metric::Metric;

/// A volume metric is anomalous when strictly more than this many standard
/// deviations away from its baseline mean.
pub const DEVIATION_THRESHOLD: f64 = 2.0;

/// Relative change between adjacent windows that counts as a sudden shift.
pub const SIGNIFICANT_CHANGE_RATIO: f64 = 0.4;

/// Stateless classifier comparing samples against a [`Baseline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector;

impl AnomalyDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classifies one sample against `baseline` using the three volume metrics.
    #[must_use]
    pub fn detect_anomaly(&self, sample: &TrafficSample, baseline: &Baseline) -> AnomalyResult {
        let mut anomalous = Vec::new();
        let mut deviation: f64 = 0.0;
        let mut max_dev: f64 = 0.0;
        let mut above = 0;
        let mut below = 0;

        for metric in Metric::VOLUME {
            let signed = signed_deviation(sample, baseline, metric);
            let dev = signed.abs();
            max_dev = max_dev.max(dev);
            if dev > DEVIATION_THRESHOLD {
                anomalous.push(metric);
                deviation = deviation.max(dev);
                if signed > 0.0 {
                    above += 1;
                } else {
                    below += 1;
                }
            }
        }

        let anomaly_type = if anomalous.is_empty() {
            None
        } else if above == Metric::VOLUME.len() {
            Some(AnomalyType::Spike)
        } else if below == Metric::VOLUME.len() {
            Some(AnomalyType::Drop)
        } else {
            Some(AnomalyType::Pattern)
        };

        AnomalyResult {
            is_anomaly: !anomalous.is_empty(),
            description: describe(anomaly_type, &anomalous),
            anomaly_type,
            anomalous_metrics: anomalous,
            deviation,
            confidence: confidence(max_dev),
        }
    }

    /// Compares all five metrics of `sample` with `baseline`.
    ///
    /// A zero baseline mean yields a change rate of 100 for a non-zero
    /// value and 0 otherwise.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn compare_with_baseline(
        &self,
        sample: &TrafficSample,
        baseline: &Baseline,
    ) -> BaselineComparison {
        let change_rate = TrafficMetrics::from_fn(|m| {
            let mean = baseline.mean(m);
            let value = sample.value(m);
            if mean == 0.0 {
                if value == 0.0 {
                    0.0
                } else {
                    100.0
                }
            } else {
                (value - mean) / mean * 100.0
            }
        });

        BaselineComparison {
            current: sample.metrics,
            baseline: baseline.values,
            change_rate,
            deviation: TrafficMetrics::from_fn(|m| signed_deviation(sample, baseline, m)),
            anomaly_detection: self.detect_anomaly(sample, baseline),
        }
    }

    /// Returns the anomalous samples of `samples`, in input order.
    #[must_use]
    pub fn detect_batch_anomalies(
        &self,
        samples: &[TrafficSample],
        baseline: &Baseline,
    ) -> Vec<BatchAnomaly> {
        samples
            .iter()
            .filter_map(|sample| {
                let result = self.detect_anomaly(sample, baseline);
                result.is_anomaly.then(|| BatchAnomaly {
                    sample: sample.clone(),
                    result,
                })
            })
            .collect()
    }

    /// Finds sudden page-view level shifts between adjacent windows.
    ///
    /// `samples` must already be in ascending timestamp order. Every split
    /// point `i` compares `samples[i - w..i]` with `samples[i..i + w]`; each
    /// flagged split point yields one event. Series shorter than `2·w`, and
    /// a zero window, yield nothing.
    #[must_use]
    pub fn detect_trend_anomalies(
        &self,
        samples: &[TrafficSample],
        window_size: usize,
    ) -> Vec<TrendEvent> {
        let too_short = window_size
            .checked_mul(2)
            .is_none_or(|needed| samples.len() < needed);
        if window_size == 0 || too_short {
            return Vec::new();
        }

        let page_views: Vec<f64> = samples.iter().map(|s| s.value(Metric::PageViews)).collect();
        let mut events = Vec::new();

        for split in window_size..=samples.len() - window_size {
            let mean_before = stats::mean(&page_views[split - window_size..split]);
            let mean_after = stats::mean(&page_views[split..split + window_size]);
            // relative change is undefined against an empty window
            if mean_before <= 0.0 {
                continue;
            }

            let trend = if mean_after >= mean_before * (1.0 + SIGNIFICANT_CHANGE_RATIO) {
                TrendDirection::SuddenIncrease
            } else if mean_after <= mean_before * (1.0 - SIGNIFICANT_CHANGE_RATIO) {
                TrendDirection::SuddenDecrease
            } else {
                continue;
            };

            events.push(TrendEvent {
                trend,
                index: split,
                timestamp: samples[split].timestamp,
                mean_before,
                mean_after,
                magnitude: (mean_after - mean_before) / mean_before,
            });
        }

        events
    }
}

/// `(value - mean) / stddev`, or `0` on a degenerate baseline.
fn signed_deviation(sample: &TrafficSample, baseline: &Baseline, metric: Metric) -> f64 {
    let stddev = baseline.stddev(metric);
    if stddev > 0.0 {
        (sample.value(metric) - baseline.mean(metric)) / stddev
    } else {
        0.0
    }
}

/// Maps the largest deviation to a 0–100 confidence score.
///
/// Anchors: 2σ → 50, 4σ → 90, capped at 100 from 9σ.
fn confidence(max_dev: f64) -> f64 {
    if max_dev < DEVIATION_THRESHOLD {
        max_dev / 2.0 * 50.0
    } else if max_dev < 4.0 {
        (max_dev - 2.0) / 2.0 * 40.0 + 50.0
    } else {
        (max_dev - 4.0).mul_add(2.0, 90.0).min(100.0)
    }
}

fn describe(anomaly_type: Option<AnomalyType>, metrics: &[Metric]) -> String {
    let names = metrics
        .iter()
        .map(Metric::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    match anomaly_type {
        None => "All metrics within normal range".to_string(),
        Some(AnomalyType::Spike) => format!("Traffic spike detected across {names}"),
        Some(AnomalyType::Drop) => format!("Traffic drop detected across {names}"),
        Some(AnomalyType::Pattern) => {
            format!("Multiple metrics show an unusual pattern: {names}")
        }
    }
}
