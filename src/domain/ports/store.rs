use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::baseline::Baseline;
use crate::domain::entities::traffic::TrafficSample;
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    ReadFailed(String),
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// Column samples can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Timestamp,
    PageViews,
    UniqueVisitors,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, ordering and paging for [`TrafficStore::query_samples`].
///
/// The default matches every sample, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    pub platform: Option<Platform>,
    /// Inclusive
    pub since: Option<DateTime<Utc>>,
    /// Inclusive
    pub until: Option<DateTime<Utc>>,
    pub include_anomalies: bool,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Default for SampleQuery {
    fn default() -> Self {
        Self {
            platform: None,
            since: None,
            until: None,
            include_anomalies: true,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            offset: 0,
            limit: None,
        }
    }
}

impl SampleQuery {
    /// All samples of `platform` from `since` onward, oldest first.
    #[must_use]
    pub fn history(platform: Platform, since: DateTime<Utc>) -> Self {
        Self {
            platform: Some(platform),
            since: Some(since),
            order: SortOrder::Asc,
            ..Self::default()
        }
    }

    /// Whether `sample` passes the platform, time-range and anomaly filters.
    #[must_use]
    pub fn matches(&self, sample: &TrafficSample) -> bool {
        self.platform.is_none_or(|p| p == sample.platform)
            && self.since.is_none_or(|t| sample.timestamp >= t)
            && self.until.is_none_or(|t| sample.timestamp <= t)
            && (self.include_anomalies || !sample.is_anomaly)
    }
}

/// Row counts and time span of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub total_samples: usize,
    pub total_baselines: usize,
    pub samples_by_platform: BTreeMap<Platform, usize>,
    pub oldest_sample: Option<DateTime<Utc>>,
    pub newest_sample: Option<DateTime<Utc>>,
}

pub trait TrafficStore: Send + Sync {
    /// Persist samples.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    fn save_samples(&self, samples: &[TrafficSample]) -> Result<(), StoreError>;

    /// Retrieve samples matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn query_samples(&self, query: &SampleQuery) -> Result<Vec<TrafficSample>, StoreError>;

    /// Delete samples strictly older than `cutoff`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    fn delete_samples_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Summarize what the store currently holds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn stats(&self) -> Result<StorageStats, StoreError>;
}

/// Holds the single current baseline per `(platform, mode)`.
pub trait BaselineStore: Send + Sync {
    /// Persist `baseline` unless the stored one for the same key is newer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write operation fails.
    fn save_baseline(&self, baseline: &Baseline) -> Result<(), StoreError>;

    /// Retrieve the current baseline for `platform` and `mode`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read operation fails.
    fn latest_baseline(
        &self,
        platform: Platform,
        mode: BaselineMode,
    ) -> Result<Option<Baseline>, StoreError>;
}
