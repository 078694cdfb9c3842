//! Numeric primitives shared by the baseline engine.
//!
//! All functions are total: empty and single-element inputs return defined
//! values instead of panicking or producing NaN.

use crate::domain::entities::traffic::TrafficSample;
use crate::domain::value_objects::metric::Metric;

/// Tukey fence multiplier for the IQR outlier filter.
const IQR_FENCE: f64 = 1.5;

/// Minimum number of samples before outlier filtering is attempted.
const MIN_OUTLIER_SAMPLES: usize = 4;

/// Arithmetic mean, `0.0` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `N`), `0.0` for fewer than two values.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let squared: Vec<f64> = values.iter().map(|v| (v - m).powi(2)).collect();
    mean(&squared).sqrt()
}

/// Percentile `p` (0–100) of an ascending slice using linear interpolation
/// between the order statistics around rank `p/100 · (n-1)`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let last = sorted.len() - 1;
            let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f64;
            let lower = (rank.floor() as usize).min(last);
            let upper = (rank.ceil() as usize).min(last);
            let weight = rank - lower as f64;
            sorted[lower].mul_add(1.0 - weight, sorted[upper] * weight)
        }
    }
}

/// Returns a sorted copy of `values`.
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Descriptive statistics of one metric column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl Summary {
    /// Summarizes `values`; every field is `0.0` for an empty slice.
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let ordered = sorted(values);
        Self {
            mean: mean(values),
            std_dev: std_dev(values),
            min: ordered[0],
            max: ordered[ordered.len() - 1],
            median: percentile(&ordered, 50.0),
            q1: percentile(&ordered, 25.0),
            q3: percentile(&ordered, 75.0),
        }
    }

    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Drops samples whose page views fall outside `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]`.
///
/// Page views are the only metric inspected. Fewer than four samples are
/// returned unchanged.
#[must_use]
pub fn filter_outliers(samples: &[TrafficSample]) -> Vec<TrafficSample> {
    if samples.len() < MIN_OUTLIER_SAMPLES {
        return samples.to_vec();
    }

    let page_views: Vec<f64> = samples.iter().map(|s| s.value(Metric::PageViews)).collect();
    let summary = Summary::of(&page_views);
    let lower = IQR_FENCE.mul_add(-summary.iqr(), summary.q1);
    let upper = IQR_FENCE.mul_add(summary.iqr(), summary.q3);

    samples
        .iter()
        .filter(|s| {
            let pv = s.value(Metric::PageViews);
            pv >= lower && pv <= upper
        })
        .cloned()
        .collect()
}
