pub mod baseline;
pub mod cleanup;
pub mod collect;
pub mod compare;
pub mod detect;
pub mod import;
pub mod report;
pub mod status;
pub mod summary;

use chrono::{DateTime, TimeDelta, Utc};

/// Start of a look-back window of `days` days ending now.
///
/// # Errors
///
/// Returns an error if `days` is zero or reaches before the earliest
/// representable date.
pub fn days_ago(days: u32) -> anyhow::Result<DateTime<Utc>> {
    if days == 0 {
        anyhow::bail!("Time window must be greater than 0");
    }
    let delta = TimeDelta::try_days(i64::from(days))
        .ok_or_else(|| anyhow::anyhow!("invalid time window"))?;
    Utc::now()
        .checked_sub_signed(delta)
        .ok_or_else(|| anyhow::anyhow!("invalid time window"))
}
