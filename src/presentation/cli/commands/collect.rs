use anyhow::Context;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use colored::Colorize;

use crate::application::services::collection::{collect_batch, time_series, RetryPolicy};
use crate::domain::ports::collector::{CollectionWindow, TrafficSource};
use crate::domain::ports::store::TrafficStore;
use crate::presentation::cli::formatters::status_fmt::print_section_header;

/// Daily windows covering the `days` UTC calendar days ending with `now`'s day.
fn daily_windows(now: DateTime<Utc>, days: u32) -> Vec<CollectionWindow> {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let first = today - TimeDelta::days(i64::from(days.saturating_sub(1)));
    time_series(first, today, TimeDelta::days(1))
        .into_iter()
        .map(|start| {
            CollectionWindow::new(start, start + TimeDelta::days(1) - TimeDelta::seconds(1))
        })
        .collect()
}

/// Collects the last `days` days from `source` and stores the samples.
///
/// Windows that still fail after retrying are reported and skipped.
/// Returns the number of stored samples.
///
/// # Errors
///
/// Returns an error if `days` is zero or the samples cannot be saved.
pub async fn run_collect(
    source: &dyn TrafficSource,
    store: &dyn TrafficStore,
    policy: &RetryPolicy,
    days: u32,
) -> anyhow::Result<usize> {
    if days == 0 {
        anyhow::bail!("Time window must be greater than 0");
    }
    let platform = source.platform();
    let windows = daily_windows(Utc::now(), days);

    let mut samples = Vec::new();
    let mut failed = 0;
    let mut retried = 0;
    for result in collect_batch(source, &windows, policy).await {
        match result {
            Ok(outcome) => {
                if outcome.attempts > 1 {
                    retried += 1;
                }
                samples.extend(outcome.samples);
            }
            Err(e) => {
                tracing::warn!(%platform, "window skipped: {e}");
                failed += 1;
            }
        }
    }

    store
        .save_samples(&samples)
        .context("Failed to save collected samples")?;
    let low_quality = samples.iter().filter(|s| s.is_low_quality()).count();

    print_section_header(&format!("📥 Collected {platform} traffic"));
    println!("  Windows: {}", windows.len());
    println!("  Samples stored: {}", samples.len().to_string().bold());
    if retried > 0 {
        println!("  {}", format!("Windows needing retries: {retried}").yellow());
    }
    if low_quality > 0 {
        println!("  {}", format!("Low quality samples: {low_quality}").yellow());
    }
    if failed > 0 {
        println!("  {}", format!("Failed windows: {failed}").red().bold());
    }
    println!();

    Ok(samples.len())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::ports::store::SampleQuery;
    use crate::domain::value_objects::platform::Platform;
    use crate::infrastructure::collectors::mock_collector::MockCollector;
    use crate::infrastructure::persistence::in_memory_store::InMemoryStore;
    use chrono::TimeZone;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn daily_windows_cover_whole_days() {
        let now = Utc
            .with_ymd_and_hms(2024, 6, 10, 15, 30, 0)
            .single()
            .expect("valid timestamp");
        let windows = daily_windows(now, 3);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start.to_rfc3339(), "2024-06-08T00:00:00+00:00");
        assert_eq!(windows[2].end.to_rfc3339(), "2024-06-10T23:59:59+00:00");
    }

    #[tokio::test]
    async fn collect_stores_one_sample_per_day() {
        let store = InMemoryStore::new();
        let source = MockCollector::new(Platform::Youtube).with_seed(11);
        let stored = run_collect(&source, &store, &fast_policy(), 14)
            .await
            .expect("collect");
        assert_eq!(stored, 14);

        let samples = store
            .query_samples(&SampleQuery {
                platform: Some(Platform::Youtube),
                ..SampleQuery::default()
            })
            .expect("query");
        assert_eq!(samples.len(), 14);
    }

    #[tokio::test]
    async fn failing_source_stores_nothing() {
        let store = InMemoryStore::new();
        let source = MockCollector::new(Platform::Mock)
            .with_seed(2)
            .with_failure_rate(1.0);
        let stored = run_collect(&source, &store, &fast_policy(), 3)
            .await
            .expect("collect");
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn zero_days_is_rejected() {
        let store = InMemoryStore::new();
        let source = MockCollector::new(Platform::Mock);
        assert!(run_collect(&source, &store, &fast_policy(), 0).await.is_err());
    }
}
