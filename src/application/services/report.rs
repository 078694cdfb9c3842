use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::config::ReportConfig;
use crate::application::services::analysis::AnalysisService;
use crate::domain::entities::anomaly::{BaselineComparison, BatchAnomaly};
use crate::domain::entities::traffic::{TrafficSample, TrafficSummary};
use crate::domain::ports::store::{SampleQuery, SortOrder, TrafficStore};
use crate::domain::stats;
use crate::domain::value_objects::anomaly_kind::{AnomalyType, Direction};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::metric::Metric;
use crate::domain::value_objects::platform::Platform;

/// Half-over-half page-view change (in percent) beyond which a platform
/// is trending up or down.
const TREND_CHANGE_PERCENT: f64 = 10.0;

/// Average data quality below which the report asks for better collection.
const MIN_DATA_QUALITY: f64 = 80.0;

/// Cross-platform totals for the report period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOverview {
    pub total_page_views: f64,
    pub total_unique_visitors: f64,
    pub total_sessions: f64,
    pub avg_bounce_rate: f64,
    /// Mean quality score of scored samples, 100 when none are scored
    pub data_quality: f64,
    pub platform_count: usize,
}

/// Movement of one platform's page views between the two halves of the period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformTrend {
    pub platform: Platform,
    pub direction: Direction,
    /// Percent
    pub change_rate: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformComparison {
    pub platform: Platform,
    pub comparison: BaselineComparison,
}

/// Everything stored for one period, across all platforms with traffic.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub mode: BaselineMode,
    pub version: String,
    pub overview: ReportOverview,
    pub platform_summaries: Vec<TrafficSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_comparisons: Option<Vec<PlatformComparison>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<BatchAnomaly>>,
    pub trends: Vec<PlatformTrend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

/// Builds period reports on top of [`AnalysisService`].
pub struct ReportService<'a> {
    traffic_store: &'a dyn TrafficStore,
    analysis: &'a AnalysisService<'a>,
    config: ReportConfig,
}

impl<'a> ReportService<'a> {
    #[must_use]
    pub fn new(
        traffic_store: &'a dyn TrafficStore,
        analysis: &'a AnalysisService<'a>,
        config: ReportConfig,
    ) -> Self {
        Self {
            traffic_store,
            analysis,
            config,
        }
    }

    /// Report on every platform with samples between `start` and `end`,
    /// measured against the stored `mode` baselines.
    ///
    /// # Errors
    ///
    /// Returns an error if reading samples or baselines fails.
    pub fn generate(
        &self,
        mode: BaselineMode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TrafficReport> {
        let query = SampleQuery {
            since: Some(start),
            until: Some(end),
            order: SortOrder::Asc,
            ..SampleQuery::default()
        };
        let samples = self
            .traffic_store
            .query_samples(&query)
            .context("Failed to load traffic for report")?;

        let mut by_platform: BTreeMap<Platform, Vec<TrafficSample>> = BTreeMap::new();
        for sample in &samples {
            by_platform
                .entry(sample.platform)
                .or_default()
                .push(sample.clone());
        }

        let mut platform_summaries = Vec::with_capacity(by_platform.len());
        let mut trends = Vec::with_capacity(by_platform.len());
        let mut comparisons = Vec::new();
        let mut anomalies = Vec::new();

        for (&platform, platform_samples) in &by_platform {
            platform_summaries.push(self.analysis.summary(platform, start, end)?);
            trends.push(platform_trend(platform, platform_samples));

            if self.config.include_baseline {
                if let Some(comparison) = self.analysis.compare_latest(platform, mode)? {
                    comparisons.push(PlatformComparison {
                        platform,
                        comparison,
                    });
                }
            }
            if self.config.include_anomalies {
                let scan = self.analysis.scan_between(platform, mode, start, end)?;
                anomalies.extend(scan.anomalies);
            }
        }

        let overview = overview(&platform_summaries, &samples);
        let anomalies = self.config.include_anomalies.then_some(anomalies);
        let recommendations = self
            .config
            .include_recommendations
            .then(|| recommend(anomalies.as_deref(), &trends, &overview));

        tracing::info!(
            platforms = overview.platform_count,
            samples = samples.len(),
            anomalies = anomalies.as_ref().map_or(0, Vec::len),
            "report generated"
        );

        Ok(TrafficReport {
            title: self.config.title.clone(),
            generated_at: Utc::now(),
            period_start: start,
            period_end: end,
            mode,
            version: env!("CARGO_PKG_VERSION").to_string(),
            overview,
            platform_summaries,
            baseline_comparisons: self.config.include_baseline.then_some(comparisons),
            anomalies,
            trends,
            recommendations,
        })
    }
}

fn overview(summaries: &[TrafficSummary], samples: &[TrafficSample]) -> ReportOverview {
    let bounce_rates: Vec<f64> = summaries.iter().map(|s| s.avg_bounce_rate).collect();
    let scores: Vec<f64> = samples
        .iter()
        .filter_map(|s| s.quality_score.map(f64::from))
        .collect();

    ReportOverview {
        total_page_views: summaries.iter().map(|s| s.total_page_views).sum(),
        total_unique_visitors: summaries.iter().map(|s| s.total_unique_visitors).sum(),
        total_sessions: summaries.iter().map(|s| s.total_sessions).sum(),
        avg_bounce_rate: stats::mean(&bounce_rates),
        data_quality: if scores.is_empty() {
            100.0
        } else {
            stats::mean(&scores)
        },
        platform_count: summaries.len(),
    }
}

/// Compares the mean page views of the first and second half of `samples`,
/// which must be in ascending time order.
fn platform_trend(platform: Platform, samples: &[TrafficSample]) -> PlatformTrend {
    if samples.len() < 2 {
        return PlatformTrend {
            platform,
            direction: Direction::Stable,
            change_rate: 0.0,
            description: "Insufficient data for trend analysis".to_string(),
        };
    }

    let page_views: Vec<f64> = samples.iter().map(|s| s.value(Metric::PageViews)).collect();
    let (first, second) = page_views.split_at(page_views.len() / 2);
    let before = stats::mean(first);
    let after = stats::mean(second);
    let change_rate = if before > 0.0 {
        (after - before) / before * 100.0
    } else if after > 0.0 {
        100.0
    } else {
        0.0
    };

    let (direction, description) = if change_rate > TREND_CHANGE_PERCENT {
        (
            Direction::Up,
            format!("Upward trend detected with {change_rate:.1}% increase"),
        )
    } else if change_rate < -TREND_CHANGE_PERCENT {
        (
            Direction::Down,
            format!(
                "Downward trend detected with {:.1}% decrease",
                change_rate.abs()
            ),
        )
    } else {
        (
            Direction::Stable,
            format!(
                "Stable traffic pattern with {:.1}% variation",
                change_rate.abs()
            ),
        )
    };

    PlatformTrend {
        platform,
        direction,
        change_rate,
        description,
    }
}

fn join_platforms(platforms: impl Iterator<Item = Platform>) -> String {
    let mut unique: Vec<Platform> = platforms.collect();
    unique.sort();
    unique.dedup();
    unique
        .iter()
        .map(Platform::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn recommend(
    anomalies: Option<&[BatchAnomaly]>,
    trends: &[PlatformTrend],
    overview: &ReportOverview,
) -> Vec<String> {
    let mut out = Vec::new();
    let has_type = |anomalies: &[BatchAnomaly], kind: AnomalyType| {
        anomalies
            .iter()
            .any(|a| a.result.anomaly_type == Some(kind))
    };

    if let Some(anomalies) = anomalies.filter(|a| !a.is_empty()) {
        out.push(format!(
            "Investigate anomalies detected on {} platforms",
            join_platforms(anomalies.iter().map(|a| a.sample.platform))
        ));
        if has_type(anomalies, AnomalyType::Spike) {
            out.push(
                "Traffic spikes detected - verify if these are from legitimate campaigns or potential issues"
                    .to_string(),
            );
        }
        if has_type(anomalies, AnomalyType::Drop) {
            out.push(
                "Traffic drops detected - check for technical issues or content problems"
                    .to_string(),
            );
        }
    }

    let trending = |direction: Direction| {
        join_platforms(
            trends
                .iter()
                .filter(|t| t.direction == direction)
                .map(|t| t.platform),
        )
    };
    let declining = trending(Direction::Down);
    if !declining.is_empty() {
        out.push(format!("Address declining traffic on {declining}"));
    }
    let growing = trending(Direction::Up);
    if !growing.is_empty() {
        out.push(format!("Capitalize on growing traffic on {growing}"));
    }

    if overview.data_quality < MIN_DATA_QUALITY {
        out.push(format!(
            "Improve data collection quality - current quality score is below {MIN_DATA_QUALITY:.0}%"
        ));
    }

    if out.is_empty() {
        out.push("Traffic patterns are within normal ranges - continue monitoring".to_string());
    }
    out
}
