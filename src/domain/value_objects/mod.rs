pub mod anomaly_kind;
pub mod baseline_config;
pub mod baseline_mode;
pub mod metric;
pub mod platform;

pub use anomaly_kind::{AnomalyType, Direction, TrendDirection};
pub use baseline_config::{BaselineConfig, BaselineConfigUpdate};
pub use baseline_mode::BaselineMode;
pub use metric::Metric;
pub use platform::Platform;
