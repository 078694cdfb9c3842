#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use trafficwatch::application::config::{AppConfig, ReportConfig};
use trafficwatch::application::services::analysis::AnalysisService;
use trafficwatch::application::services::collection::{
    collect_batch, collect_with_retry, time_series, RetryPolicy,
};
use trafficwatch::application::services::report::ReportService;
use trafficwatch::domain::engines::BaselineEngine;
use trafficwatch::domain::ports::collector::{CollectionError, CollectionWindow, TrafficSource};
use trafficwatch::domain::ports::store::{BaselineStore, SampleQuery, TrafficStore};
use trafficwatch::domain::value_objects::anomaly_kind::{AnomalyType, TrendDirection};
use trafficwatch::domain::value_objects::baseline_mode::BaselineMode;
use trafficwatch::domain::value_objects::platform::Platform;
use trafficwatch::infrastructure::collectors::json_file_collector::JsonFileCollector;
use trafficwatch::infrastructure::collectors::mock_collector::MockCollector;
use trafficwatch::infrastructure::persistence::in_memory_store::InMemoryStore;
use trafficwatch::infrastructure::persistence::sqlite_store::SqliteStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn fixture(name: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn april_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn make_sqlite(dir: &tempfile::TempDir) -> SqliteStore {
    let path = dir.path().join("traffic.db");
    SqliteStore::new(path.to_str().expect("utf-8 path")).expect("open store")
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

// ---------------------------------------------------------------------------
// Import → baseline → detection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn imported_history_flags_final_spike() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = make_sqlite(&dir);

    let source = JsonFileCollector::new(fixture("traffic_export.json"), Platform::Youtube);
    let window = CollectionWindow::new(april_first(), april_first() + TimeDelta::days(30));
    let outcome = collect_with_retry(&source, window, &fast_policy())
        .await
        .expect("collect");
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.samples.len(), 21);
    store.save_samples(&outcome.samples).expect("save");

    let engine = BaselineEngine::new(AppConfig::default().baseline);
    let service = AnalysisService::new(&store, &store, &engine, 3);

    // the spike on the last day falls outside the IQR fences
    let baseline = service
        .refresh_baseline(Platform::Youtube, BaselineMode::Daily, april_first(), false)
        .expect("refresh")
        .expect("baseline");
    assert_eq!(baseline.sample_size, 20);
    assert!((baseline.values.page_views - 2000.0).abs() < 1e-9);
    assert!((baseline.standard_deviation.page_views - 100.0).abs() < 1e-9);

    let report = service
        .scan(Platform::Youtube, BaselineMode::Daily, april_first())
        .expect("scan");
    assert_eq!(report.samples_checked, 21);
    assert_eq!(report.anomalies.len(), 1);
    let spike = &report.anomalies[0];
    assert_eq!(spike.result.anomaly_type, Some(AnomalyType::Spike));
    assert!((spike.result.confidence - 100.0).abs() < f64::EPSILON);
    assert_eq!(
        spike.sample.timestamp,
        april_first() + TimeDelta::days(20)
    );
    assert!(report
        .trends
        .iter()
        .all(|t| t.trend == TrendDirection::SuddenIncrease));
    assert!(!report.trends.is_empty());
}

#[tokio::test]
async fn other_platforms_in_the_export_stay_separate() {
    let store = InMemoryStore::new();
    let source = JsonFileCollector::new(fixture("traffic_export.json"), Platform::Twitter);
    let window = CollectionWindow::new(april_first(), april_first() + TimeDelta::days(30));
    let outcome = collect_with_retry(&source, window, &fast_policy())
        .await
        .expect("collect");
    store.save_samples(&outcome.samples).expect("save");

    let stats = store.stats().expect("stats");
    assert_eq!(stats.total_samples, 5);
    assert_eq!(stats.samples_by_platform.get(&Platform::Twitter), Some(&5));
    assert_eq!(stats.samples_by_platform.get(&Platform::Youtube), None);

    // five samples are below the default minimum of seven
    let engine = BaselineEngine::default();
    let service = AnalysisService::new(&store, &store, &engine, 3);
    assert!(service
        .refresh_baseline(Platform::Twitter, BaselineMode::Daily, april_first(), false)
        .expect("refresh")
        .is_none());
}

#[tokio::test]
async fn report_spans_all_imported_platforms() {
    let store = InMemoryStore::new();
    let window = CollectionWindow::new(april_first(), april_first() + TimeDelta::days(30));
    for platform in [Platform::Youtube, Platform::Twitter] {
        let source = JsonFileCollector::new(fixture("traffic_export.json"), platform);
        let outcome = collect_with_retry(&source, window, &fast_policy())
            .await
            .expect("collect");
        store.save_samples(&outcome.samples).expect("save");
    }

    let engine = BaselineEngine::new(AppConfig::default().baseline);
    let analysis = AnalysisService::new(&store, &store, &engine, 3);
    analysis
        .refresh_baseline(Platform::Youtube, BaselineMode::Daily, april_first(), false)
        .expect("refresh")
        .expect("baseline");

    let reports = ReportService::new(&store, &analysis, ReportConfig::default());
    let report = reports
        .generate(BaselineMode::Daily, window.start, window.end)
        .expect("report");

    assert_eq!(report.overview.platform_count, 2);
    assert_eq!(report.platform_summaries.len(), 2);
    // twitter has no baseline, so only the youtube spike is reported
    let anomalies = report.anomalies.expect("anomalies section");
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].sample.platform, Platform::Youtube);
    assert_eq!(
        report.baseline_comparisons.expect("baseline section").len(),
        1
    );
    let recommendations = report.recommendations.expect("recommendations");
    assert_eq!(
        recommendations[0],
        "Investigate anomalies detected on youtube platforms"
    );
}

// ---------------------------------------------------------------------------
// Mock collection → aggregated baseline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mock_collection_feeds_weekly_baseline() {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp");
    let windows: Vec<CollectionWindow> =
        time_series(start, start + TimeDelta::days(55), TimeDelta::days(1))
            .into_iter()
            .map(|day| CollectionWindow::new(day, day + TimeDelta::hours(23)))
            .collect();

    let source = MockCollector::new(Platform::Mock).with_seed(2024);
    let results = collect_batch(&source, &windows, &fast_policy()).await;
    assert_eq!(results.len(), 56);

    let store = InMemoryStore::new();
    for result in results {
        let outcome = result.expect("mock collection never fails");
        store.save_samples(&outcome.samples).expect("save");
    }
    assert_eq!(store.stats().expect("stats").total_samples, 56);

    let engine = BaselineEngine::default();
    let service = AnalysisService::new(&store, &store, &engine, 3);
    let baseline = service
        .refresh_baseline(Platform::Mock, BaselineMode::Weekly, start, true)
        .expect("refresh")
        .expect("nine weekly buckets are enough");
    assert_eq!(baseline.mode, BaselineMode::Weekly);
    assert!(baseline.sample_size <= 9);
    assert!((5_600.0..=12_000.0).contains(&baseline.values.page_views));
    assert!(store
        .latest_baseline(Platform::Mock, BaselineMode::Weekly)
        .expect("read")
        .is_some());
}

#[tokio::test]
async fn unreliable_source_exhausts_retries() {
    let source = MockCollector::new(Platform::Tiktok)
        .with_seed(1)
        .with_failure_rate(1.0);
    let window = CollectionWindow::new(april_first(), april_first() + TimeDelta::days(1));
    let err = collect_with_retry(&source, window, &fast_policy())
        .await
        .expect_err("must fail");
    match err {
        CollectionError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.contains("tiktok"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(source.platform(), Platform::Tiktok);
}

// ---------------------------------------------------------------------------
// Persistence across runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sqlite_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let store = make_sqlite(&dir);
        let source = JsonFileCollector::new(fixture("traffic_export.json"), Platform::Youtube);
        let window = CollectionWindow::new(april_first(), april_first() + TimeDelta::days(30));
        let outcome = collect_with_retry(&source, window, &fast_policy())
            .await
            .expect("collect");
        store.save_samples(&outcome.samples).expect("save");

        let engine = BaselineEngine::default();
        let service = AnalysisService::new(&store, &store, &engine, 3);
        service
            .refresh_baseline(Platform::Youtube, BaselineMode::Weekly, april_first(), false)
            .expect("refresh")
            .expect("baseline");
    }

    let store = make_sqlite(&dir);
    let baseline = store
        .latest_baseline(Platform::Youtube, BaselineMode::Weekly)
        .expect("read")
        .expect("baseline persisted");
    assert_eq!(baseline.sample_size, 20);

    let newest = store
        .query_samples(&SampleQuery {
            platform: Some(Platform::Youtube),
            limit: Some(1),
            ..SampleQuery::default()
        })
        .expect("query");
    assert!((newest[0].metrics.page_views - 8000.0).abs() < f64::EPSILON);

    let engine = BaselineEngine::default();
    let service = AnalysisService::new(&store, &store, &engine, 3);
    let comparison = service
        .compare_latest(Platform::Youtube, BaselineMode::Weekly)
        .expect("compare")
        .expect("comparison");
    assert!((comparison.change_rate.page_views - 300.0).abs() < 1e-9);
    assert!(comparison.anomaly_detection.is_anomaly);
}
