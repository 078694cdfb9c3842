use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;

use crate::domain::entities::traffic::{TrafficSample, LOW_QUALITY_SCORE};
use crate::domain::ports::collector::{CollectionError, CollectionWindow, TrafficSource};
use crate::domain::value_objects::platform::Platform;

/// Retry, timeout and batching rules applied around a [`TrafficSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Upper bound for a single fetch
    pub timeout: Duration,
    /// Windows fetched concurrently by [`collect_batch`]
    pub batch_size: usize,
    /// Samples scoring below this are logged, not dropped
    pub min_quality_score: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            batch_size: 100,
            min_quality_score: LOW_QUALITY_SCORE,
        }
    }
}

/// Samples gathered by one successful collection.
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub platform: Platform,
    pub window: CollectionWindow,
    pub samples: Vec<TrafficSample>,
    /// Total fetch attempts, including the successful one
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Fetch, standardize and validate one window, retrying failed fetches.
///
/// Each attempt is bounded by `policy.timeout`; failed attempts are
/// followed by a `policy.retry_delay` pause.
///
/// # Errors
///
/// Returns `CollectionError::Exhausted` carrying the last failure once
/// `1 + policy.max_retries` attempts have failed.
pub async fn collect_with_retry(
    source: &dyn TrafficSource,
    window: CollectionWindow,
    policy: &RetryPolicy,
) -> Result<CollectionOutcome, CollectionError> {
    let started = Instant::now();
    let platform = source.platform();
    let total_attempts = policy.max_retries.saturating_add(1);
    let mut last_error = CollectionError::Timeout;

    for attempt in 1..=total_attempts {
        let fetched = tokio::time::timeout(policy.timeout, source.fetch(window))
            .await
            .unwrap_or(Err(CollectionError::Timeout));

        match fetched {
            Ok(raw) => {
                let samples = validate(source.standardize(raw), policy);
                tracing::debug!(
                    %platform,
                    attempt,
                    samples = samples.len(),
                    "collection succeeded"
                );
                return Ok(CollectionOutcome {
                    platform,
                    window,
                    samples,
                    attempts: attempt,
                    elapsed: started.elapsed(),
                });
            }
            Err(e) => {
                if attempt < total_attempts {
                    tracing::warn!(
                        %platform,
                        attempt,
                        max_retries = policy.max_retries,
                        "collection failed, retrying: {e}"
                    );
                    tokio::time::sleep(policy.retry_delay).await;
                }
                last_error = e;
            }
        }
    }

    Err(CollectionError::Exhausted {
        attempts: total_attempts,
        last: last_error.to_string(),
    })
}

/// Collect several windows, `policy.batch_size` at a time.
///
/// Results are returned in the order of `windows`; one failing window
/// does not affect the others.
pub async fn collect_batch(
    source: &dyn TrafficSource,
    windows: &[CollectionWindow],
    policy: &RetryPolicy,
) -> Vec<Result<CollectionOutcome, CollectionError>> {
    let mut results = Vec::with_capacity(windows.len());
    for chunk in windows.chunks(policy.batch_size.max(1)) {
        let batch = join_all(
            chunk
                .iter()
                .map(|window| collect_with_retry(source, *window, policy)),
        )
        .await;
        results.extend(batch);
    }
    results
}

/// Timestamps from `start` to `end` inclusive, `step` apart.
///
/// A non-positive `step` yields only `start` (or nothing if `start > end`).
#[must_use]
pub fn time_series(start: DateTime<Utc>, end: DateTime<Utc>, step: TimeDelta) -> Vec<DateTime<Utc>> {
    let mut series = Vec::new();
    let mut current = start;
    while current <= end {
        series.push(current);
        if step <= TimeDelta::zero() {
            break;
        }
        current += step;
    }
    series
}

/// Keeps every sample, logging those under the quality bar.
fn validate(samples: Vec<TrafficSample>, policy: &RetryPolicy) -> Vec<TrafficSample> {
    for sample in &samples {
        let score = sample.quality_score.unwrap_or(0);
        if score < policy.min_quality_score {
            tracing::warn!(
                platform = %sample.platform,
                timestamp = %sample.timestamp,
                score,
                "low quality traffic sample"
            );
        }
    }
    samples
}
