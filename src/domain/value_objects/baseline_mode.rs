use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation granularity a baseline is computed for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMode {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl BaselineMode {
    /// Returns the UTC calendar date identifying the bucket `timestamp` falls into.
    ///
    /// Daily buckets are the calendar day, weekly buckets start on the
    /// preceding (or same) Sunday, monthly buckets start on the 1st.
    #[must_use]
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        let day = timestamp.date_naive();
        match self {
            Self::Daily => day,
            Self::Weekly => {
                let offset = i64::from(day.weekday().num_days_from_sunday());
                day - chrono::TimeDelta::days(offset)
            }
            // with_day(1) cannot fail for an existing date
            Self::Monthly => day.with_day(1).unwrap_or(day),
        }
    }
}

impl std::fmt::Display for BaselineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for BaselineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!(
                "unknown baseline mode '{other}' (expected daily, weekly or monthly)"
            )),
        }
    }
}
