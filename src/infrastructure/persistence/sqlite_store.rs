use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::domain::entities::baseline::Baseline;
use crate::domain::entities::traffic::{TrafficMetrics, TrafficSample};
use crate::domain::ports::store::{
    BaselineStore, SampleQuery, SortField, SortOrder, StorageStats, StoreError, TrafficStore,
};
use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;

use super::migrations;

/// SQLite-backed persistent store for traffic samples and baselines.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new `SQLite` store at the given path.
    ///
    /// Expands `~`, creates parent directories, opens connection,
    /// sets WAL mode and pragmas, and initializes schema.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if the database cannot be opened or initialized.
    pub fn new(path: &str) -> Result<Self, StoreError> {
        let expanded = shellexpand::tilde(path);
        let db_path = PathBuf::from(expanded.as_ref());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        let conn =
            Connection::open(&db_path).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        migrations::initialize_schema(&conn).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Remove samples older than the given retention period.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::WriteFailed` if deletion fails.
    pub fn cleanup_old(&self, retention_days: u32) -> Result<usize, StoreError> {
        let delta = chrono::TimeDelta::try_days(i64::from(retention_days))
            .ok_or_else(|| StoreError::WriteFailed("invalid retention days".into()))?;
        let cutoff = Utc::now()
            .checked_sub_signed(delta)
            .ok_or_else(|| StoreError::WriteFailed("invalid retention days".into()))?;
        self.delete_samples_before(cutoff)
    }
}

/// Fixed-width UTC timestamps so text comparison matches time order.
fn encode_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    column: usize,
    e: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, e.into())
}

fn parse_timestamp(column: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn parse_sample_row(row: &rusqlite::Row<'_>) -> Result<TrafficSample, rusqlite::Error> {
    let platform: String = row.get(0)?;
    let recorded_at: String = row.get(1)?;

    Ok(TrafficSample {
        platform: platform
            .parse::<Platform>()
            .map_err(|e| conversion_error(0, e))?,
        timestamp: parse_timestamp(1, &recorded_at)?,
        metrics: TrafficMetrics {
            page_views: row.get(2)?,
            unique_visitors: row.get(3)?,
            sessions: row.get(4)?,
            avg_session_duration: row.get(5)?,
            bounce_rate: row.get(6)?,
        },
        quality_score: row.get(7)?,
        is_anomaly: row.get(8)?,
    })
}

const fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Timestamp => "recorded_at",
        SortField::PageViews => "page_views",
        SortField::UniqueVisitors => "unique_visitors",
    }
}

impl TrafficStore for SqliteStore {
    fn save_samples(&self, samples: &[TrafficSample]) -> Result<(), StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let tx = conn
            .transaction()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO traffic_samples (platform, recorded_at, page_views, \
                     unique_visitors, sessions, avg_session_duration, bounce_rate, \
                     quality_score, is_anomaly) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            for sample in samples {
                stmt.execute(params![
                    sample.platform.as_str(),
                    encode_timestamp(sample.timestamp),
                    sample.metrics.page_views,
                    sample.metrics.unique_visitors,
                    sample.metrics.sessions,
                    sample.metrics.avg_session_duration,
                    sample.metrics.bounce_rate,
                    sample.quality_score,
                    sample.is_anomaly,
                ])
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            }
        }
        tx.commit()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        drop(conn);
        Ok(())
    }

    fn query_samples(&self, query: &SampleQuery) -> Result<Vec<TrafficSample>, StoreError> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(platform) = query.platform {
            clauses.push("platform = ?");
            values.push(Value::Text(platform.as_str().to_string()));
        }
        if let Some(since) = query.since {
            clauses.push("recorded_at >= ?");
            values.push(Value::Text(encode_timestamp(since)));
        }
        if let Some(until) = query.until {
            clauses.push("recorded_at <= ?");
            values.push(Value::Text(encode_timestamp(until)));
        }
        if !query.include_anomalies {
            clauses.push("is_anomaly = 0");
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let limit = query
            .limit
            .map_or(Ok(-1), i64::try_from)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        let offset =
            i64::try_from(query.offset).map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));

        let sql = format!(
            "SELECT platform, recorded_at, page_views, unique_visitors, sessions, \
             avg_session_duration, bounce_rate, quality_score, is_anomaly \
             FROM traffic_samples{where_clause} \
             ORDER BY {column} {direction}, id {direction} LIMIT ? OFFSET ?",
            column = sort_column(query.sort_by),
        );

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        let samples = stmt
            .query_map(params_from_iter(values.iter()), parse_sample_row)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        drop(stmt);
        drop(conn);
        Ok(samples)
    }

    fn delete_samples_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;
        let removed = conn
            .execute(
                "DELETE FROM traffic_samples WHERE recorded_at < ?1",
                params![encode_timestamp(cutoff)],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        drop(conn);
        Ok(removed)
    }

    fn stats(&self) -> Result<StorageStats, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let (total_samples, oldest, newest): (i64, Option<String>, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), MIN(recorded_at), MAX(recorded_at) FROM traffic_samples",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        let total_baselines: i64 = conn
            .query_row("SELECT COUNT(*) FROM baselines", [], |row| row.get(0))
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        let mut stmt = conn
            .prepare("SELECT platform, COUNT(*) FROM traffic_samples GROUP BY platform")
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        let per_platform = stmt
            .query_map([], |row| {
                let platform: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                let platform = platform
                    .parse::<Platform>()
                    .map_err(|e| conversion_error(0, e))?;
                Ok((platform, usize::try_from(count).unwrap_or(0)))
            })
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        drop(stmt);
        drop(conn);

        let parse = |raw: Option<String>| {
            raw.map(|s| parse_timestamp(0, &s))
                .transpose()
                .map_err(|e| StoreError::ReadFailed(e.to_string()))
        };

        Ok(StorageStats {
            total_samples: usize::try_from(total_samples).unwrap_or(0),
            total_baselines: usize::try_from(total_baselines).unwrap_or(0),
            samples_by_platform: per_platform,
            oldest_sample: parse(oldest)?,
            newest_sample: parse(newest)?,
        })
    }
}

impl BaselineStore for SqliteStore {
    fn save_baseline(&self, baseline: &Baseline) -> Result<(), StoreError> {
        let data =
            serde_json::to_string(baseline).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::WriteFailed("lock poisoned".into()))?;

        // keeps the stored row when it is newer than the incoming one
        conn.execute(
            "INSERT INTO baselines (platform, mode, updated_at, data) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(platform, mode) DO UPDATE SET \
                 updated_at = excluded.updated_at, \
                 data = excluded.data \
             WHERE excluded.updated_at >= baselines.updated_at",
            params![
                baseline.platform.as_str(),
                baseline.mode.to_string(),
                encode_timestamp(baseline.updated_at),
                data,
            ],
        )
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        drop(conn);
        Ok(())
    }

    fn latest_baseline(
        &self,
        platform: Platform,
        mode: BaselineMode,
    ) -> Result<Option<Baseline>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::ReadFailed("lock poisoned".into()))?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM baselines WHERE platform = ?1 AND mode = ?2",
                params![platform.as_str(), mode.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        drop(conn);

        data.map(|json| {
            serde_json::from_str(&json).map_err(|e| StoreError::ReadFailed(e.to_string()))
        })
        .transpose()
    }
}
