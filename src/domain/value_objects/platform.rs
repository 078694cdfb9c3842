use serde::{Deserialize, Serialize};

/// Traffic source platform a sample was collected from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Twitter,
    Instagram,
    Tiktok,
    Facebook,
    /// Synthetic platform used by the mock collector and tests
    Mock,
}

impl Platform {
    pub const ALL: [Self; 6] = [
        Self::Youtube,
        Self::Twitter,
        Self::Instagram,
        Self::Tiktok,
        Self::Facebook,
        Self::Mock,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Facebook => "facebook",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform '{s}'"))
    }
}
