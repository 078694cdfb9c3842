use std::collections::HashMap;

use chrono::{NaiveDate, Utc};

use crate::domain::entities::baseline::{AnomalyThresholds, Baseline, BaselinePeriod};
use crate::domain::entities::traffic::{TrafficMetrics, TrafficSample};
use crate::domain::stats;
use crate::domain::value_objects::baseline_config::{BaselineConfig, BaselineConfigUpdate};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;

/// Computes baselines from historical samples.
///
/// The engine owns its [`BaselineConfig`]; computations take `&self` and
/// never touch anything else, so they may run concurrently as long as
/// nobody calls [`BaselineEngine::update_config`] at the same time.
#[derive(Debug, Clone, Default)]
pub struct BaselineEngine {
    config: BaselineConfig,
}

impl BaselineEngine {
    #[must_use]
    pub fn new(config: BaselineConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    /// Computes a baseline for `platform` and `mode` from `samples`.
    ///
    /// Returns `None` (and logs a warning) when fewer than
    /// `min_sample_size` samples are supplied. When outlier exclusion is
    /// enabled every statistic, including the sample size and period, is
    /// derived from the filtered set.
    #[must_use]
    pub fn calculate_baseline(
        &self,
        samples: &[TrafficSample],
        platform: Platform,
        mode: BaselineMode,
    ) -> Option<Baseline> {
        if samples.len() < self.config.min_sample_size {
            tracing::warn!(
                %platform,
                %mode,
                required = self.config.min_sample_size,
                got = samples.len(),
                "insufficient samples for baseline"
            );
            return None;
        }

        let filtered = if self.config.exclude_outliers {
            stats::filter_outliers(samples)
        } else {
            samples.to_vec()
        };
        if filtered.len() < samples.len() {
            tracing::debug!(
                %platform,
                removed = samples.len() - filtered.len(),
                "excluded outliers before baseline computation"
            );
        }

        let start = filtered.iter().map(|s| s.timestamp).min()?;
        let end = filtered.iter().map(|s| s.timestamp).max()?;

        let column = |metric| filtered.iter().map(|s| s.value(metric)).collect::<Vec<f64>>();
        let values = TrafficMetrics::from_fn(|m| stats::mean(&column(m)));
        let standard_deviation = TrafficMetrics::from_fn(|m| stats::std_dev(&column(m)));
        let anomaly_threshold = AnomalyThresholds::from_stats(
            &values,
            &standard_deviation,
            self.config.anomaly_threshold_multiplier,
        );

        let now = Utc::now();
        Some(Baseline {
            platform,
            mode,
            period: BaselinePeriod { start, end },
            values,
            standard_deviation,
            anomaly_threshold,
            sample_size: filtered.len(),
            confidence: self.config.confidence_level * 100.0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Collapses `samples` into one averaged sample per `mode` bucket.
    ///
    /// Buckets appear in the order their first sample was seen. Each
    /// aggregate is stamped at midnight UTC of the bucket date and carries
    /// the platform of the first sample in its bucket.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn aggregate_by_mode(
        &self,
        samples: &[TrafficSample],
        mode: BaselineMode,
    ) -> Vec<TrafficSample> {
        let mut order: Vec<(NaiveDate, Vec<&TrafficSample>)> = Vec::new();
        let mut index: HashMap<NaiveDate, usize> = HashMap::new();

        for sample in samples {
            let key = mode.bucket_start(sample.timestamp);
            match index.get(&key) {
                Some(&i) => order[i].1.push(sample),
                None => {
                    index.insert(key, order.len());
                    order.push((key, vec![sample]));
                }
            }
        }

        order
            .into_iter()
            .map(|(day, bucket)| {
                let metrics = TrafficMetrics::from_fn(|m| {
                    let column: Vec<f64> = bucket.iter().map(|s| s.value(m)).collect();
                    stats::mean(&column)
                });
                TrafficSample {
                    platform: bucket[0].platform,
                    timestamp: day.and_time(chrono::NaiveTime::MIN).and_utc(),
                    metrics,
                    quality_score: None,
                    is_anomaly: false,
                }
            })
            .collect()
    }

    /// Merges the set fields of `update` into the live configuration.
    ///
    /// Takes effect on subsequent calls only. Merged values go through the
    /// same clamping as [`BaselineEngine::new`]: `min_sample_size` is at
    /// least 1, a negative multiplier becomes 0 and `confidence_level` is
    /// kept within `[0, 1]`. Non-finite numbers fall back to their defaults.
    /// Any adjustment is logged as a warning.
    pub fn update_config(&mut self, update: &BaselineConfigUpdate) {
        let mut merged = self.config.clone();
        merged.apply(update);
        let sanitized = merged.sanitized();
        if sanitized != merged {
            tracing::warn!(
                requested = ?merged,
                applied = ?sanitized,
                "baseline config update adjusted to valid range"
            );
        }
        self.config = sanitized;
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> BaselineConfig {
        self.config.clone()
    }
}
