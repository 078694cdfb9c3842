use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::entities::baseline::Baseline;
use crate::domain::entities::traffic::TrafficSample;
use crate::domain::ports::store::{
    BaselineStore, SampleQuery, SortField, SortOrder, StorageStats, StoreError, TrafficStore,
};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;

/// In-memory store for tests and one-shot runs.
pub struct InMemoryStore {
    samples: Mutex<Vec<TrafficSample>>,
    baselines: Mutex<HashMap<(Platform, BaselineMode), Baseline>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            baselines: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn compare(a: &TrafficSample, b: &TrafficSample, field: SortField) -> Ordering {
    match field {
        SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
        SortField::PageViews => a.metrics.page_views.total_cmp(&b.metrics.page_views),
        SortField::UniqueVisitors => a
            .metrics
            .unique_visitors
            .total_cmp(&b.metrics.unique_visitors),
    }
}

impl TrafficStore for InMemoryStore {
    fn save_samples(&self, samples: &[TrafficSample]) -> Result<(), StoreError> {
        self.samples
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?
            .extend_from_slice(samples);
        Ok(())
    }

    fn query_samples(&self, query: &SampleQuery) -> Result<Vec<TrafficSample>, StoreError> {
        let mut results: Vec<TrafficSample> = self
            .samples
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .iter()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();

        results.sort_by(|a, b| match query.order {
            SortOrder::Asc => compare(a, b, query.sort_by),
            SortOrder::Desc => compare(b, a, query.sort_by),
        });

        Ok(results
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn delete_samples_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut samples = self
            .samples
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let before = samples.len();
        samples.retain(|s| s.timestamp >= cutoff);
        Ok(before - samples.len())
    }

    fn stats(&self) -> Result<StorageStats, StoreError> {
        let samples = self
            .samples
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;
        let mut samples_by_platform = BTreeMap::new();
        for sample in samples.iter() {
            *samples_by_platform.entry(sample.platform).or_insert(0) += 1;
        }
        let stats = StorageStats {
            total_samples: samples.len(),
            total_baselines: 0,
            samples_by_platform,
            oldest_sample: samples.iter().map(|s| s.timestamp).min(),
            newest_sample: samples.iter().map(|s| s.timestamp).max(),
        };
        drop(samples);

        let total_baselines = self
            .baselines
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?
            .len();
        Ok(StorageStats {
            total_baselines,
            ..stats
        })
    }
}

impl BaselineStore for InMemoryStore {
    fn save_baseline(&self, baseline: &Baseline) -> Result<(), StoreError> {
        let mut baselines = self
            .baselines
            .lock()
            .map_err(|e| StoreError::WriteFailed(format!("lock: {e}")))?;
        let key = (baseline.platform, baseline.mode);
        let is_newer = baselines
            .get(&key)
            .is_none_or(|existing| baseline.updated_at >= existing.updated_at);
        if is_newer {
            baselines.insert(key, baseline.clone());
        }
        drop(baselines);
        Ok(())
    }

    fn latest_baseline(
        &self,
        platform: Platform,
        mode: BaselineMode,
    ) -> Result<Option<Baseline>, StoreError> {
        Ok(self
            .baselines
            .lock()
            .map_err(|e| StoreError::ReadFailed(format!("lock: {e}")))?
            .get(&(platform, mode))
            .cloned())
    }
}
