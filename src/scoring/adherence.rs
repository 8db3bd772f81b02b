use std::sync::Arc;

use serde::Serialize;

use crate::services::{CrossingTimeEstimator, StopTimeProvider};
use crate::types::{StopTimeEntry, VehiclePosition};

/// Coarse description of a schedule delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayClass {
    VeryEarly,
    Early,
    OnTime,
    SlightlyLate,
    Late,
    VeryLate,
    Unknown,
}

impl DelayClass {
    pub fn from_delay(delay_sec: Option<i64>) -> Self {
        let Some(delay) = delay_sec else {
            return DelayClass::Unknown;
        };
        match delay {
            d if d < -120 => DelayClass::VeryEarly,
            d if d < -60 => DelayClass::Early,
            d if d <= 60 => DelayClass::OnTime,
            d if d <= 180 => DelayClass::SlightlyLate,
            d if d <= 300 => DelayClass::Late,
            _ => DelayClass::VeryLate,
        }
    }
}

/// Delay of a single vehicle against its schedule, from its interpolated position.
pub struct ScheduleAdherenceCalculator {
    stop_times: Arc<dyn StopTimeProvider>,
    estimator: Arc<dyn CrossingTimeEstimator>,
}

impl ScheduleAdherenceCalculator {
    pub fn new(stop_times: Arc<dyn StopTimeProvider>, estimator: Arc<dyn CrossingTimeEstimator>) -> Self {
        Self {
            stop_times,
            estimator,
        }
    }

    /// Seconds behind schedule (negative when early), `None` when it cannot be derived.
    pub fn calculate_delay(&self, vehicle: &VehiclePosition) -> Option<i64> {
        let stop_times = self.stop_times.stop_times_for_trip(vehicle.trip_id.as_deref()?)?;
        let progress = self.estimator.estimate_progress(vehicle)?;
        let expected = expected_time_at(&stop_times, progress)?;
        Some(vehicle.timestamp - expected)
    }
}

/// Linear interpolation of the scheduled time at `progress` along the stop list.
fn expected_time_at(stop_times: &[StopTimeEntry], progress: f64) -> Option<i64> {
    if stop_times.len() < 2 {
        return None;
    }

    let last = stop_times.len() - 1;
    let target = progress.clamp(0.0, 1.0) * last as f64;
    let before = target.floor() as usize;
    let after = (before + 1).min(last);
    let fraction = target - before as f64;

    let before_time = stop_times[before].departure_or_arrival()?;
    let after_time = stop_times[after].arrival_or_departure()?;
    if after_time <= before_time {
        return None;
    }

    let expected = before_time as f64 + fraction * (after_time - before_time) as f64;
    Some(expected.round() as i64)
}
