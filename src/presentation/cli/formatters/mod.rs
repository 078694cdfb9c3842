pub mod anomaly_fmt;
pub mod status_fmt;
