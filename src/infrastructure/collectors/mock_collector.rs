use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeDelta, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::entities::traffic::RawTrafficRecord;
use crate::domain::ports::collector::{CollectionError, CollectionWindow, TrafficSource};
use crate::domain::value_objects::platform::Platform;

const BASE_PAGE_VIEWS: f64 = 10_000.0;
const BASE_UNIQUE_VISITORS: f64 = 3_000.0;
const BASE_SESSIONS: f64 = 4_000.0;
/// ±20% uniform noise around the base values
const NOISE: f64 = 0.2;
const WEEKEND_FACTOR: f64 = 0.7;
const ANOMALY_PROBABILITY: f64 = 0.05;
const DROP_FACTOR: f64 = 0.3;
const SPIKE_FACTOR: f64 = 2.5;

/// Generates synthetic traffic with weekly seasonality.
///
/// Weekend days run at 70% of weekday volume. When anomaly injection is on,
/// 5% of the points are multiplied by 0.3 or 2.5 and flagged. A fixed seed
/// makes the series reproducible.
pub struct MockCollector {
    platform: Platform,
    step: TimeDelta,
    inject_anomalies: bool,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl MockCollector {
    /// One daily point per fetch window, seeded from entropy.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            step: TimeDelta::days(1),
            inject_anomalies: false,
            failure_rate: 0.0,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Spacing between generated points; non-positive values fall back to one day.
    #[must_use]
    pub fn with_step(mut self, step: TimeDelta) -> Self {
        self.step = if step > TimeDelta::zero() {
            step
        } else {
            TimeDelta::days(1)
        };
        self
    }

    #[must_use]
    pub const fn with_anomalies(mut self, enabled: bool) -> Self {
        self.inject_anomalies = enabled;
        self
    }

    /// Probability in `[0, 1]` that a fetch fails outright.
    #[must_use]
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    fn generate(&self, rng: &mut StdRng, timestamp: DateTime<Utc>) -> RawTrafficRecord {
        let seasonal = match timestamp.weekday() {
            Weekday::Sat | Weekday::Sun => WEEKEND_FACTOR,
            _ => 1.0,
        };
        let mut noisy = |base: f64| base * seasonal * rng.gen_range(1.0 - NOISE..=1.0 + NOISE);

        let page_views = noisy(BASE_PAGE_VIEWS);
        let unique_visitors = noisy(BASE_UNIQUE_VISITORS);
        let sessions = noisy(BASE_SESSIONS);

        let is_anomaly = self.inject_anomalies && rng.gen_bool(ANOMALY_PROBABILITY);
        let factor = match (is_anomaly, rng.gen_bool(0.5)) {
            (false, _) => 1.0,
            (true, true) => DROP_FACTOR,
            (true, false) => SPIKE_FACTOR,
        };

        RawTrafficRecord {
            platform: self.platform,
            timestamp,
            page_views: (page_views * factor).round(),
            unique_visitors: (unique_visitors * factor).round(),
            sessions: (sessions * factor).round(),
            avg_session_duration: rng.gen_range(300.0..=600.0),
            bounce_rate: rng.gen_range(30.0..=70.0),
            is_anomaly,
        }
    }
}

#[async_trait]
impl TrafficSource for MockCollector {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(
        &self,
        window: CollectionWindow,
    ) -> Result<Vec<RawTrafficRecord>, CollectionError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| CollectionError::FetchFailed(format!("rng lock poisoned: {e}")))?;

        if self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate) {
            return Err(CollectionError::FetchFailed(format!(
                "simulated {} outage",
                self.platform
            )));
        }

        let mut records = Vec::new();
        let mut timestamp = window.start;
        while window.contains(timestamp) {
            records.push(self.generate(&mut rng, timestamp));
            timestamp += self.step;
        }
        drop(rng);

        tracing::debug!(platform = %self.platform, records = records.len(), "mock traffic generated");
        Ok(records)
    }
}
