use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::engines::{AnomalyDetector, BaselineEngine};
use crate::domain::entities::anomaly::{BaselineComparison, BatchAnomaly, TrendEvent};
use crate::domain::entities::baseline::Baseline;
use crate::domain::entities::traffic::TrafficSummary;
use crate::domain::ports::store::{BaselineStore, SampleQuery, SortOrder, TrafficStore};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;

/// Outcome of scanning recent traffic against the stored baseline.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub platform: Platform,
    pub mode: BaselineMode,
    /// `None` when no baseline has been computed yet
    pub baseline: Option<Baseline>,
    pub samples_checked: usize,
    pub anomalies: Vec<BatchAnomaly>,
    pub trends: Vec<TrendEvent>,
}

/// Connects the stores to the baseline engine and the anomaly detector.
///
/// The engine never persists anything itself; this service reads history
/// from storage, runs the computation and writes the result back.
pub struct AnalysisService<'a> {
    traffic_store: &'a dyn TrafficStore,
    baseline_store: &'a dyn BaselineStore,
    engine: &'a BaselineEngine,
    detector: AnomalyDetector,
    trend_window: usize,
}

impl<'a> AnalysisService<'a> {
    #[must_use]
    pub fn new(
        traffic_store: &'a dyn TrafficStore,
        baseline_store: &'a dyn BaselineStore,
        engine: &'a BaselineEngine,
        trend_window: usize,
    ) -> Self {
        Self {
            traffic_store,
            baseline_store,
            engine,
            detector: AnomalyDetector::new(),
            trend_window,
        }
    }

    /// Recompute and store the baseline for `platform` and `mode` from the
    /// samples recorded since `since`.
    ///
    /// With `aggregate` set, samples are first averaged per `mode` bucket.
    /// Returns `None` when there is not enough history.
    ///
    /// # Errors
    ///
    /// Returns an error if reading samples or saving the baseline fails.
    pub fn refresh_baseline(
        &self,
        platform: Platform,
        mode: BaselineMode,
        since: DateTime<Utc>,
        aggregate: bool,
    ) -> Result<Option<Baseline>> {
        let history = self
            .traffic_store
            .query_samples(&SampleQuery::history(platform, since))
            .context("Failed to load traffic history")?;
        let samples = if aggregate {
            self.engine.aggregate_by_mode(&history, mode)
        } else {
            history
        };

        let Some(baseline) = self.engine.calculate_baseline(&samples, platform, mode) else {
            return Ok(None);
        };
        self.baseline_store
            .save_baseline(&baseline)
            .context("Failed to save baseline")?;
        tracing::info!(
            %platform,
            %mode,
            sample_size = baseline.sample_size,
            "baseline refreshed"
        );
        Ok(Some(baseline))
    }

    /// Check every sample since `since` against the stored baseline and look
    /// for sudden level shifts in the same series.
    ///
    /// # Errors
    ///
    /// Returns an error if reading samples or the baseline fails.
    pub fn scan(
        &self,
        platform: Platform,
        mode: BaselineMode,
        since: DateTime<Utc>,
    ) -> Result<ScanReport> {
        self.scan_matching(platform, mode, &SampleQuery::history(platform, since))
    }

    /// Same as [`scan`](Self::scan), limited to samples recorded between
    /// `start` and `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns an error if reading samples or the baseline fails.
    pub fn scan_between(
        &self,
        platform: Platform,
        mode: BaselineMode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ScanReport> {
        let query = SampleQuery {
            until: Some(end),
            ..SampleQuery::history(platform, start)
        };
        self.scan_matching(platform, mode, &query)
    }

    fn scan_matching(
        &self,
        platform: Platform,
        mode: BaselineMode,
        query: &SampleQuery,
    ) -> Result<ScanReport> {
        let samples = self
            .traffic_store
            .query_samples(query)
            .context("Failed to load recent traffic")?;
        let baseline = self
            .baseline_store
            .latest_baseline(platform, mode)
            .context("Failed to load baseline")?;

        let anomalies = baseline.as_ref().map_or_else(Vec::new, |b| {
            self.detector.detect_batch_anomalies(&samples, b)
        });
        if baseline.is_none() {
            tracing::warn!(%platform, %mode, "no baseline stored, skipping point anomaly checks");
        }
        let trends = self
            .detector
            .detect_trend_anomalies(&samples, self.trend_window);

        Ok(ScanReport {
            platform,
            mode,
            baseline,
            samples_checked: samples.len(),
            anomalies,
            trends,
        })
    }

    /// Compare the most recent sample of `platform` with its stored baseline.
    ///
    /// Returns `None` when either the sample or the baseline is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if reading samples or the baseline fails.
    pub fn compare_latest(
        &self,
        platform: Platform,
        mode: BaselineMode,
    ) -> Result<Option<BaselineComparison>> {
        let query = SampleQuery {
            platform: Some(platform),
            order: SortOrder::Desc,
            limit: Some(1),
            ..SampleQuery::default()
        };
        let latest = self
            .traffic_store
            .query_samples(&query)
            .context("Failed to load latest sample")?;
        let baseline = self
            .baseline_store
            .latest_baseline(platform, mode)
            .context("Failed to load baseline")?;

        Ok(match (latest.first(), baseline) {
            (Some(sample), Some(baseline)) => {
                Some(self.detector.compare_with_baseline(sample, &baseline))
            }
            _ => None,
        })
    }

    /// Totals and averages of non-anomalous traffic between `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading samples fails.
    pub fn summary(
        &self,
        platform: Platform,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TrafficSummary> {
        let query = SampleQuery {
            platform: Some(platform),
            since: Some(start),
            until: Some(end),
            include_anomalies: false,
            ..SampleQuery::default()
        };
        let samples = self
            .traffic_store
            .query_samples(&query)
            .context("Failed to load traffic for summary")?;
        Ok(TrafficSummary::from_samples(platform, start, end, &samples))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::traffic::{TrafficMetrics, TrafficSample};
    use crate::domain::value_objects::anomaly_kind::{AnomalyType, TrendDirection};
    use crate::domain::value_objects::baseline_config::BaselineConfig;
    use crate::infrastructure::persistence::in_memory_store::InMemoryStore;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn sample(day: i64, page_views: f64) -> TrafficSample {
        TrafficSample::new(
            Platform::Youtube,
            t0() + TimeDelta::days(day),
            TrafficMetrics {
                page_views,
                unique_visitors: page_views * 0.3,
                sessions: page_views * 0.4,
                avg_session_duration: 200.0,
                bounce_rate: 40.0,
            },
        )
    }

    /// Two weeks of gently varying traffic.
    fn history() -> Vec<TrafficSample> {
        (0..14)
            .map(|d| sample(d, if d % 2 == 0 { 950.0 } else { 1050.0 }))
            .collect()
    }

    fn engine() -> BaselineEngine {
        BaselineEngine::new(BaselineConfig::default())
    }

    #[test]
    fn refresh_baseline_persists_result() {
        let store = InMemoryStore::new();
        store.save_samples(&history()).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);

        let baseline = service
            .refresh_baseline(Platform::Youtube, BaselineMode::Daily, t0(), false)
            .expect("refresh")
            .expect("enough history");
        assert_eq!(baseline.sample_size, 14);
        assert!((baseline.values.page_views - 1000.0).abs() < 1e-9);

        let stored = store
            .latest_baseline(Platform::Youtube, BaselineMode::Daily)
            .expect("read")
            .expect("stored");
        assert_eq!(stored, baseline);
    }

    #[test]
    fn refresh_baseline_with_too_little_history_stores_nothing() {
        let store = InMemoryStore::new();
        store.save_samples(&history()[..3]).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);

        let result = service
            .refresh_baseline(Platform::Youtube, BaselineMode::Daily, t0(), false)
            .expect("refresh");
        assert!(result.is_none());
        assert!(store
            .latest_baseline(Platform::Youtube, BaselineMode::Daily)
            .expect("read")
            .is_none());
    }

    #[test]
    fn aggregated_weekly_refresh_needs_enough_weeks() {
        let store = InMemoryStore::new();
        store.save_samples(&history()).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);

        // 14 days collapse into at most 3 weekly buckets
        let result = service
            .refresh_baseline(Platform::Youtube, BaselineMode::Weekly, t0(), true)
            .expect("refresh");
        assert!(result.is_none());
    }

    #[test]
    fn scan_flags_spike_against_stored_baseline() {
        let store = InMemoryStore::new();
        store.save_samples(&history()).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);
        service
            .refresh_baseline(Platform::Youtube, BaselineMode::Daily, t0(), false)
            .expect("refresh");

        store.save_samples(&[sample(14, 5000.0)]).expect("save spike");
        let report = service
            .scan(Platform::Youtube, BaselineMode::Daily, t0())
            .expect("scan");

        assert!(report.baseline.is_some());
        assert_eq!(report.samples_checked, 15);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(
            report.anomalies[0].result.anomaly_type,
            Some(AnomalyType::Spike)
        );
    }

    #[test]
    fn scan_between_ignores_samples_after_the_end() {
        let store = InMemoryStore::new();
        store.save_samples(&history()).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);
        service
            .refresh_baseline(Platform::Youtube, BaselineMode::Daily, t0(), false)
            .expect("refresh");

        store.save_samples(&[sample(20, 5000.0)]).expect("save spike");
        let report = service
            .scan_between(
                Platform::Youtube,
                BaselineMode::Daily,
                t0(),
                t0() + TimeDelta::days(13),
            )
            .expect("scan");
        assert_eq!(report.samples_checked, 14);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn scan_without_baseline_still_reports_trends() {
        let store = InMemoryStore::new();
        let mut samples: Vec<TrafficSample> = (0..6).map(|d| sample(d, 1000.0)).collect();
        samples.extend((6..12).map(|d| sample(d, 3000.0)));
        store.save_samples(&samples).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);

        let report = service
            .scan(Platform::Youtube, BaselineMode::Daily, t0())
            .expect("scan");
        assert!(report.baseline.is_none());
        assert!(report.anomalies.is_empty());
        assert!(report
            .trends
            .iter()
            .any(|t| t.trend == TrendDirection::SuddenIncrease && t.index == 6));
    }

    #[test]
    fn compare_latest_uses_newest_sample() {
        let store = InMemoryStore::new();
        store.save_samples(&history()).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);

        assert!(service
            .compare_latest(Platform::Youtube, BaselineMode::Daily)
            .expect("compare")
            .is_none());

        service
            .refresh_baseline(Platform::Youtube, BaselineMode::Daily, t0(), false)
            .expect("refresh");
        store.save_samples(&[sample(20, 1100.0)]).expect("save");

        let comparison = service
            .compare_latest(Platform::Youtube, BaselineMode::Daily)
            .expect("compare")
            .expect("comparison");
        assert!((comparison.current.page_views - 1100.0).abs() < f64::EPSILON);
        assert!((comparison.change_rate.page_views - 10.0).abs() < 1e-9);
    }

    #[test]
    fn summary_skips_flagged_samples() {
        let store = InMemoryStore::new();
        let mut samples = history();
        samples.push(sample(14, 9999.0).with_anomaly_flag(true));
        store.save_samples(&samples).expect("save");
        let engine = engine();
        let service = AnalysisService::new(&store, &store, &engine, 3);

        let summary = service
            .summary(Platform::Youtube, t0(), t0() + TimeDelta::days(30))
            .expect("summary");
        assert_eq!(summary.data_points, 14);
        assert!((summary.total_page_views - 14_000.0).abs() < 1e-9);
    }
}
