use serde::{Deserialize, Serialize};

/// Shape of a detected anomaly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyType {
    /// All volume metrics anomalous and above their means
    Spike,
    /// All volume metrics anomalous and below their means
    Drop,
    /// Partial or mixed-direction anomaly
    Pattern,
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spike => write!(f, "spike"),
            Self::Drop => write!(f, "drop"),
            Self::Pattern => write!(f, "pattern"),
        }
    }
}

/// Direction of a sudden level shift found by trend detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    SuddenIncrease,
    SuddenDecrease,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuddenIncrease => write!(f, "sudden_increase"),
            Self::SuddenDecrease => write!(f, "sudden_decrease"),
        }
    }
}

/// Overall movement of a platform's page views across a report period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Stable => write!(f, "stable"),
        }
    }
}
