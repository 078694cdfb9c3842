use rusqlite::Connection;

/// Initialize the database schema, creating tables if they don't exist.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS traffic_samples (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            platform              TEXT    NOT NULL,
            recorded_at           TEXT    NOT NULL,
            page_views            REAL    NOT NULL,
            unique_visitors       REAL    NOT NULL,
            sessions              REAL    NOT NULL,
            avg_session_duration  REAL    NOT NULL,
            bounce_rate           REAL    NOT NULL,
            quality_score         INTEGER,
            is_anomaly            INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS baselines (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            platform    TEXT    NOT NULL,
            mode        TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL,
            data        TEXT    NOT NULL,
            UNIQUE(platform, mode)
        );

        CREATE INDEX IF NOT EXISTS idx_traffic_samples_platform_recorded_at
            ON traffic_samples(platform, recorded_at);
        CREATE INDEX IF NOT EXISTS idx_traffic_samples_recorded_at
            ON traffic_samples(recorded_at);",
    )?;
    Ok(())
}
