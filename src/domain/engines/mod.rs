//! Pure computations over in-memory sample windows. No I/O.

pub mod anomaly;
pub mod baseline;

pub use anomaly::AnomalyDetector;
pub use baseline::BaselineEngine;
