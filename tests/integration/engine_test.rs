#![allow(clippy::expect_used)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use trafficwatch::domain::engines::anomaly::DEVIATION_THRESHOLD;
use trafficwatch::domain::engines::{AnomalyDetector, BaselineEngine};
use trafficwatch::domain::entities::baseline::Baseline;
use trafficwatch::domain::entities::traffic::{TrafficMetrics, TrafficSample};
use trafficwatch::domain::value_objects::anomaly_kind::{AnomalyType, TrendDirection};
use trafficwatch::domain::value_objects::baseline_config::{BaselineConfig, BaselineConfigUpdate};
use trafficwatch::domain::value_objects::baseline_mode::BaselineMode;
use trafficwatch::domain::value_objects::metric::Metric;
use trafficwatch::domain::value_objects::platform::Platform;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn sample_at(day: i64, page_views: f64, unique_visitors: f64, sessions: f64) -> TrafficSample {
    TrafficSample::new(
        Platform::Youtube,
        t0() + TimeDelta::days(day),
        TrafficMetrics {
            page_views,
            unique_visitors,
            sessions,
            avg_session_duration: 300.0,
            bounce_rate: 50.0,
        },
    )
}

fn series(page_views: &[f64]) -> Vec<TrafficSample> {
    page_views
        .iter()
        .zip(0..)
        .map(|(&pv, day)| sample_at(day, pv, pv * 0.3, pv * 0.4))
        .collect()
}

fn engine_without_outlier_filter() -> BaselineEngine {
    BaselineEngine::new(BaselineConfig {
        exclude_outliers: false,
        ..BaselineConfig::default()
    })
}

/// Baseline with page views 1000±50, visitors 300±15 and sessions 400±20.
fn reference_baseline() -> Baseline {
    let history = series(&[950.0, 1050.0, 950.0, 1050.0, 950.0, 1050.0, 950.0, 1050.0]);
    engine_without_outlier_filter()
        .calculate_baseline(&history, Platform::Youtube, BaselineMode::Daily)
        .expect("baseline")
}

// ---------------------------------------------------------------------------
// Baseline computation
// ---------------------------------------------------------------------------

#[test]
fn seven_sample_reference_statistics() {
    let samples = series(&[1000.0, 1100.0, 900.0, 1000.0, 1000.0, 1000.0, 1000.0]);
    let baseline = engine_without_outlier_filter()
        .calculate_baseline(&samples, Platform::Youtube, BaselineMode::Weekly)
        .expect("baseline");

    assert_eq!(baseline.sample_size, 7);
    assert!((baseline.values.page_views - 1000.0).abs() < 1e-9);
    assert!((baseline.standard_deviation.page_views - 53.45).abs() < 0.01);
    assert_eq!(baseline.period.start, t0());
    assert_eq!(baseline.period.end, t0() + TimeDelta::days(6));
    assert!((baseline.confidence - 95.0).abs() < 1e-9);
}

#[test]
fn minimum_sample_size_is_inclusive() {
    let engine = BaselineEngine::default();
    let samples = series(&[1000.0; 7]);
    assert!(engine
        .calculate_baseline(&samples[..6], Platform::Youtube, BaselineMode::Weekly)
        .is_none());
    let baseline = engine
        .calculate_baseline(&samples, Platform::Youtube, BaselineMode::Weekly)
        .expect("baseline");
    assert_eq!(baseline.sample_size, 7);
}

#[test]
fn outlier_exclusion_never_raises_the_mean() {
    let mut values = vec![1000.0, 1020.0, 980.0, 1010.0, 990.0, 1005.0, 995.0, 1000.0];
    values.push(25_000.0);
    let samples = series(&values);

    let filtered = BaselineEngine::default()
        .calculate_baseline(&samples, Platform::Youtube, BaselineMode::Daily)
        .expect("filtered baseline");
    let unfiltered = engine_without_outlier_filter()
        .calculate_baseline(&samples, Platform::Youtube, BaselineMode::Daily)
        .expect("unfiltered baseline");

    assert!(filtered.values.page_views <= unfiltered.values.page_views);
    assert_eq!(filtered.sample_size, 8);
    assert_eq!(unfiltered.sample_size, 9);
}

#[test]
fn thresholds_follow_the_multiplier_and_floor_at_zero() {
    let mut engine = engine_without_outlier_filter();
    engine.update_config(&BaselineConfigUpdate {
        anomaly_threshold_multiplier: Some(30.0),
        ..BaselineConfigUpdate::default()
    });
    let baseline = engine
        .calculate_baseline(
            &series(&[950.0, 1050.0, 950.0, 1050.0, 950.0, 1050.0, 950.0]),
            Platform::Youtube,
            BaselineMode::Daily,
        )
        .expect("baseline");

    let upper = baseline
        .anomaly_threshold
        .upper
        .get(Metric::PageViews)
        .expect("volume metric");
    let lower = baseline
        .anomaly_threshold
        .lower
        .get(Metric::PageViews)
        .expect("volume metric");
    let expected = baseline.values.page_views + 30.0 * baseline.standard_deviation.page_views;
    assert!((upper - expected).abs() < 1e-9);
    assert!(lower.abs() < f64::EPSILON);
    assert!((engine.config().anomaly_threshold_multiplier - 30.0).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn monthly_aggregation_of_january() {
    let values: Vec<f64> = (0..31).map(|d| 1000.0 + f64::from(d) * 10.0).collect();
    let samples = series(&values);
    let aggregated = BaselineEngine::default().aggregate_by_mode(&samples, BaselineMode::Monthly);

    assert_eq!(aggregated.len(), 1);
    let expected = values.iter().sum::<f64>() / 31.0;
    assert!((aggregated[0].metrics.page_views - expected).abs() < 1e-9);
    assert_eq!(aggregated[0].timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert!(aggregated[0].quality_score.is_none());
}

#[test]
fn daily_aggregation_of_two_days() {
    let samples = vec![
        sample_at(0, 100.0, 30.0, 40.0),
        sample_at(1, 500.0, 150.0, 200.0),
        sample_at(0, 300.0, 90.0, 120.0),
    ];
    let aggregated = BaselineEngine::default().aggregate_by_mode(&samples, BaselineMode::Daily);
    assert_eq!(aggregated.len(), 2);
    assert!((aggregated[0].metrics.page_views - 200.0).abs() < 1e-9);
    assert!((aggregated[1].metrics.page_views - 500.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// Point anomalies
// ---------------------------------------------------------------------------

#[test]
fn sample_at_the_mean_is_normal() {
    let result = AnomalyDetector::new()
        .detect_anomaly(&sample_at(0, 1000.0, 300.0, 400.0), &reference_baseline());
    assert!(!result.is_anomaly);
    assert!(result.deviation.abs() < f64::EPSILON);
    assert!(result.anomaly_type.is_none());
    assert!(result.anomalous_metrics.is_empty());
}

#[test]
fn exactly_two_sigma_is_not_anomalous() {
    let baseline = reference_baseline();
    let at_threshold = 1000.0 + DEVIATION_THRESHOLD * 50.0;
    let result =
        AnomalyDetector::new().detect_anomaly(&sample_at(0, at_threshold, 300.0, 400.0), &baseline);
    assert!(!result.is_anomaly);
}

#[test]
fn single_metric_past_two_sigma_is_a_pattern() {
    let result = AnomalyDetector::new()
        .detect_anomaly(&sample_at(0, 1000.0, 300.0, 450.0), &reference_baseline());
    assert!(result.is_anomaly);
    assert_eq!(result.anomalous_metrics, vec![Metric::Sessions]);
    assert_eq!(result.anomaly_type, Some(AnomalyType::Pattern));
    assert!((result.deviation - 2.5).abs() < 1e-9);
}

#[test]
fn five_sigma_in_every_volume_metric() {
    let baseline = reference_baseline();
    let detector = AnomalyDetector::new();

    let spike = detector.detect_anomaly(&sample_at(0, 1250.0, 375.0, 500.0), &baseline);
    assert_eq!(spike.anomaly_type, Some(AnomalyType::Spike));
    assert_eq!(spike.anomalous_metrics.len(), 3);

    let drop = detector.detect_anomaly(&sample_at(0, 750.0, 225.0, 300.0), &baseline);
    assert_eq!(drop.anomaly_type, Some(AnomalyType::Drop));
    assert!((drop.confidence - 92.0).abs() < 1e-9);
}

#[test]
fn batch_detection_keeps_input_order() {
    let baseline = reference_baseline();
    let samples = vec![
        sample_at(0, 1000.0, 300.0, 400.0),
        sample_at(1, 1300.0, 390.0, 520.0),
        sample_at(2, 1000.0, 300.0, 400.0),
        sample_at(3, 600.0, 180.0, 240.0),
    ];
    let anomalies = AnomalyDetector::new().detect_batch_anomalies(&samples, &baseline);
    assert_eq!(anomalies.len(), 2);
    assert_eq!(anomalies[0].sample, samples[1]);
    assert_eq!(anomalies[0].result.anomaly_type, Some(AnomalyType::Spike));
    assert_eq!(anomalies[1].sample, samples[3]);
    assert_eq!(anomalies[1].result.anomaly_type, Some(AnomalyType::Drop));
}

#[test]
fn comparison_with_zero_mean_baseline() {
    let zero_history = series(&[0.0; 7]);
    let baseline = BaselineEngine::default()
        .calculate_baseline(&zero_history, Platform::Youtube, BaselineMode::Daily)
        .expect("baseline");

    let comparison =
        AnomalyDetector::new().compare_with_baseline(&sample_at(0, 10.0, 0.0, 0.0), &baseline);
    assert!((comparison.change_rate.page_views - 100.0).abs() < f64::EPSILON);
    assert!(comparison.change_rate.unique_visitors.abs() < f64::EPSILON);
    // zero spread means no deviation can be measured
    assert!(!comparison.anomaly_detection.is_anomaly);
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

#[test]
fn doubling_traffic_is_a_sudden_increase() {
    let mut values = vec![1000.0; 10];
    values.extend([2000.0; 10]);
    let trends = AnomalyDetector::new().detect_trend_anomalies(&series(&values), 3);
    assert!(!trends.is_empty());
    assert!(trends
        .iter()
        .all(|t| t.trend == TrendDirection::SuddenIncrease));
    let first = i64::try_from(trends[0].index).expect("index");
    assert_eq!(trends[0].timestamp, t0() + TimeDelta::days(first));
}

#[test]
fn halving_traffic_is_a_sudden_decrease() {
    let mut values = vec![2000.0; 10];
    values.extend([800.0; 10]);
    let trends = AnomalyDetector::new().detect_trend_anomalies(&series(&values), 3);
    assert!(trends
        .iter()
        .any(|t| t.trend == TrendDirection::SuddenDecrease && t.index == 10));
}

#[test]
fn gradual_drift_is_not_a_trend() {
    let values: Vec<f64> = (0..30).map(|i| 1000.0 * 1.02_f64.powi(i)).collect();
    assert!(AnomalyDetector::new()
        .detect_trend_anomalies(&series(&values), 3)
        .is_empty());
}

#[test]
fn short_series_yield_no_trends() {
    let detector = AnomalyDetector::new();
    let values = [1000.0, 1000.0, 1000.0, 5000.0, 5000.0];
    assert!(detector.detect_trend_anomalies(&series(&values), 3).is_empty());
    assert!(detector.detect_trend_anomalies(&series(&values), 0).is_empty());
}
