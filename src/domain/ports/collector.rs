use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::traffic::{RawTrafficRecord, TrafficSample};
use crate::domain::value_objects::platform::Platform;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("failed to fetch traffic data: {0}")]
    FetchFailed(String),
    #[error("invalid payload from source: {0}")]
    InvalidPayload(String),
    #[error("timeout while fetching traffic data")]
    Timeout,
    #[error("collection failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Inclusive time range requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CollectionWindow {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

/// A provider of raw traffic records for one platform.
///
/// Retry, timeout and batching live in
/// [`crate::application::services::collection`], not in implementations.
#[async_trait]
pub trait TrafficSource: Send + Sync {
    /// Platform every record from this source is attributed to.
    fn platform(&self) -> Platform;

    /// Fetch raw records whose timestamps fall inside `window`.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError` if the source is unreachable, times out
    /// or returns a payload that cannot be decoded.
    async fn fetch(&self, window: CollectionWindow)
        -> Result<Vec<RawTrafficRecord>, CollectionError>;

    /// Turn raw records into clamped, scored samples.
    fn standardize(&self, raw: Vec<RawTrafficRecord>) -> Vec<TrafficSample> {
        raw.into_iter().map(TrafficSample::from).collect()
    }
}
