//! Traits for schedule lookups used by the real-time scoring path.

use crate::types::{StopTimeEntry, VehiclePosition};

/// Read-only access to the ordered stop sequence of a trip.
pub trait StopTimeProvider: Send + Sync {
    /// Stops of `trip_id` ordered by sequence, or `None` when the trip is unknown.
    fn stop_times_for_trip(&self, trip_id: &str) -> Option<Vec<StopTimeEntry>>;

    /// First departure and last arrival of the trip, in epoch seconds.
    fn trip_duration(&self, trip_id: &str) -> Option<(i64, i64)> {
        let stops = self.stop_times_for_trip(trip_id)?;
        if stops.len() < 2 {
            return None;
        }
        let start = stops.first()?.departure_or_arrival()?;
        let end = stops.last()?.arrival_or_departure()?;
        Some((start, end))
    }
}

/// Coordinates of stops, for snapping vehicles to their nearest stop.
pub trait StopDirectory: Send + Sync {
    fn stop_location(&self, stop_id: &str) -> Option<(f64, f64)>;
}

/// Estimates when a vehicle passes a fractional point of its trip.
pub trait CrossingTimeEstimator: Send + Sync {
    /// `reference_progress` is in `[0, 1]`, 0.5 being the trip midpoint.
    fn estimate_time_at_progress(
        &self,
        vehicle: &VehiclePosition,
        reference_progress: f64,
    ) -> Option<i64>;

    /// Current progress of the vehicle along its trip, in `[0, 1]`.
    fn estimate_progress(&self, vehicle: &VehiclePosition) -> Option<f64>;
}

/// Tries a realtime provider first and falls back to the static schedule.
pub struct CompositeStopTimeProvider<R, S> {
    pub realtime: R,
    pub schedule: S,
}

impl<R, S> CompositeStopTimeProvider<R, S> {
    pub fn new(realtime: R, schedule: S) -> Self {
        Self { realtime, schedule }
    }
}

impl<R: StopTimeProvider, S: StopTimeProvider> StopTimeProvider for CompositeStopTimeProvider<R, S> {
    fn stop_times_for_trip(&self, trip_id: &str) -> Option<Vec<StopTimeEntry>> {
        self.realtime
            .stop_times_for_trip(trip_id)
            .or_else(|| self.schedule.stop_times_for_trip(trip_id))
    }

    fn trip_duration(&self, trip_id: &str) -> Option<(i64, i64)> {
        self.realtime
            .trip_duration(trip_id)
            .or_else(|| self.schedule.trip_duration(trip_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Table(HashMap<String, Vec<StopTimeEntry>>);

    impl StopTimeProvider for Table {
        fn stop_times_for_trip(&self, trip_id: &str) -> Option<Vec<StopTimeEntry>> {
            self.0.get(trip_id).cloned()
        }
    }

    fn entry(stop_id: &str, delay: Option<i64>) -> StopTimeEntry {
        StopTimeEntry {
            stop_id: stop_id.to_string(),
            sequence: 1,
            scheduled_arrival: Some(100),
            scheduled_departure: Some(100),
            delay,
        }
    }

    #[test]
    fn test_realtime_wins_then_schedule() {
        let realtime = Table(HashMap::from([("t1".to_string(), vec![entry("rt", Some(30))])]));
        let schedule = Table(HashMap::from([
            ("t1".to_string(), vec![entry("static", None)]),
            ("t2".to_string(), vec![entry("static", None)]),
        ]));
        let composite = CompositeStopTimeProvider::new(realtime, schedule);

        assert_eq!(composite.stop_times_for_trip("t1").unwrap()[0].stop_id, "rt");
        assert_eq!(composite.stop_times_for_trip("t2").unwrap()[0].stop_id, "static");
        assert!(composite.stop_times_for_trip("t3").is_none());
    }
}
