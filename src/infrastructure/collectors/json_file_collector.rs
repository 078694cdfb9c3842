use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::entities::traffic::RawTrafficRecord;
use crate::domain::ports::collector::{CollectionError, CollectionWindow, TrafficSource};
use crate::domain::value_objects::platform::Platform;

/// Reads traffic exported as a JSON array of [`RawTrafficRecord`].
///
/// The file is re-read on every fetch so edits are picked up between runs.
pub struct JsonFileCollector {
    path: PathBuf,
    platform: Platform,
}

impl JsonFileCollector {
    /// Source for the records of `platform` stored in `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, platform: Platform) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            platform,
        }
    }

    /// Every record in the file, whatever its platform or timestamp.
    ///
    /// # Errors
    ///
    /// See [`read_records`].
    pub async fn read_all(&self) -> Result<Vec<RawTrafficRecord>, CollectionError> {
        read_records(&self.path).await
    }
}

/// Parse the JSON array of records stored at `path`.
///
/// # Errors
///
/// Returns `CollectionError::FetchFailed` if the file cannot be read and
/// `CollectionError::InvalidPayload` if it is not a JSON array of records.
pub async fn read_records(path: &Path) -> Result<Vec<RawTrafficRecord>, CollectionError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CollectionError::FetchFailed(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| CollectionError::InvalidPayload(format!("{}: {e}", path.display())))
}

#[async_trait]
impl TrafficSource for JsonFileCollector {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(
        &self,
        window: CollectionWindow,
    ) -> Result<Vec<RawTrafficRecord>, CollectionError> {
        let records: Vec<RawTrafficRecord> = self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.platform == self.platform && window.contains(r.timestamp))
            .collect();
        tracing::debug!(
            platform = %self.platform,
            path = %self.path.display(),
            records = records.len(),
            "records loaded from file"
        );
        Ok(records)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use std::io::Write;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    const EXPORT: &str = r#"[
        {"platform": "youtube", "timestamp": "2024-03-01T00:00:00Z",
         "page_views": 1200, "unique_visitors": 400, "sessions": 500,
         "avg_session_duration": 210.5, "bounce_rate": 38.2},
        {"platform": "youtube", "timestamp": "2024-03-02T00:00:00Z",
         "page_views": -5, "unique_visitors": 10, "sessions": 10},
        {"platform": "twitter", "timestamp": "2024-03-01T12:00:00Z",
         "page_views": 800, "unique_visitors": 300, "sessions": 350,
         "is_anomaly": true},
        {"platform": "youtube", "timestamp": "2024-03-09T00:00:00Z",
         "page_views": 1100, "unique_visitors": 390, "sessions": 480}
    ]"#;

    fn export_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[tokio::test]
    async fn read_all_returns_every_record() {
        let file = export_file(EXPORT);
        let collector = JsonFileCollector::new(file.path(), Platform::Youtube);
        let records = collector.read_all().await.expect("read");
        assert_eq!(records.len(), 4);
        assert!(records[2].is_anomaly);
        assert!(records[1].bounce_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn fetch_filters_platform_and_window() {
        let file = export_file(EXPORT);
        let collector = JsonFileCollector::new(file.path(), Platform::Youtube);
        let window = CollectionWindow::new(t0(), t0() + TimeDelta::days(7));
        let records = collector.fetch(window).await.expect("fetch");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.platform == Platform::Youtube));
    }

    #[tokio::test]
    async fn standardize_clamps_imported_values() {
        let file = export_file(EXPORT);
        let collector = JsonFileCollector::new(file.path(), Platform::Youtube);
        let window = CollectionWindow::new(t0(), t0() + TimeDelta::days(7));
        let samples = collector.standardize(collector.fetch(window).await.expect("fetch"));
        assert!(samples[1].metrics.page_views.abs() < f64::EPSILON);
        assert!(samples.iter().all(|s| s.quality_score.is_some()));
    }

    #[tokio::test]
    async fn missing_file_is_fetch_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let collector = JsonFileCollector::new(dir.path().join("none.json"), Platform::Mock);
        let err = collector.read_all().await.expect_err("must fail");
        assert!(matches!(err, CollectionError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_payload() {
        let file = export_file(r#"{"not": "an array"}"#);
        let collector = JsonFileCollector::new(file.path(), Platform::Mock);
        let err = collector.read_all().await.expect_err("must fail");
        assert!(matches!(err, CollectionError::InvalidPayload(_)));
    }
}
