use serde::{Deserialize, Serialize};

/// One of the five traffic metrics carried by every sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PageViews,
    UniqueVisitors,
    Sessions,
    AvgSessionDuration,
    BounceRate,
}

impl Metric {
    /// Count-like metrics used for anomaly classification, in evaluation order.
    pub const VOLUME: [Self; 3] = [Self::PageViews, Self::UniqueVisitors, Self::Sessions];

    pub const ALL: [Self; 5] = [
        Self::PageViews,
        Self::UniqueVisitors,
        Self::Sessions,
        Self::AvgSessionDuration,
        Self::BounceRate,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PageViews => "page_views",
            Self::UniqueVisitors => "unique_visitors",
            Self::Sessions => "sessions",
            Self::AvgSessionDuration => "avg_session_duration",
            Self::BounceRate => "bounce_rate",
        }
    }

    #[must_use]
    pub const fn is_volume(&self) -> bool {
        matches!(self, Self::PageViews | Self::UniqueVisitors | Self::Sessions)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
