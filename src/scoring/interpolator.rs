//! Route-progress interpolation from a vehicle's GPS fix and its trip's stops.

use std::sync::Arc;

use crate::services::{CrossingTimeEstimator, StopDirectory, StopTimeProvider};
use crate::types::VehiclePosition;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Estimates progress as the nearest stop's sequence over the trip's last
/// sequence, and crossing times by spreading the trip's scheduled duration
/// linearly over progress.
pub struct PositionInterpolator {
    stop_times: Arc<dyn StopTimeProvider>,
    stops: Arc<dyn StopDirectory>,
}

impl PositionInterpolator {
    pub fn new(stop_times: Arc<dyn StopTimeProvider>, stops: Arc<dyn StopDirectory>) -> Self {
        Self { stop_times, stops }
    }

    /// Stop on the vehicle's trip closest to its current position.
    pub fn nearest_stop(&self, vehicle: &VehiclePosition) -> Option<(String, u32)> {
        let (lat, lon) = vehicle.coordinates()?;
        let trip_id = vehicle.trip_id.as_deref()?;
        let stop_times = self.stop_times.stop_times_for_trip(trip_id)?;

        stop_times
            .iter()
            .filter_map(|st| {
                let (s_lat, s_lon) = self.stops.stop_location(&st.stop_id)?;
                Some((st, haversine_distance(lat, lon, s_lat, s_lon)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(st, _)| (st.stop_id.clone(), st.sequence))
    }

    fn trip_length_secs(&self, trip_id: &str) -> Option<f64> {
        let (start, end) = self.stop_times.trip_duration(trip_id)?;
        (end > start).then(|| (end - start) as f64)
    }
}

impl CrossingTimeEstimator for PositionInterpolator {
    fn estimate_progress(&self, vehicle: &VehiclePosition) -> Option<f64> {
        let (_, nearest_seq) = self.nearest_stop(vehicle)?;
        let trip_id = vehicle.trip_id.as_deref()?;
        let max_seq = self
            .stop_times
            .stop_times_for_trip(trip_id)?
            .iter()
            .map(|st| st.sequence)
            .max()?;

        if max_seq == 0 {
            return None;
        }
        Some(nearest_seq as f64 / max_seq as f64)
    }

    fn estimate_time_at_progress(
        &self,
        vehicle: &VehiclePosition,
        reference_progress: f64,
    ) -> Option<i64> {
        let progress = self.estimate_progress(vehicle)?;

        // already past the reference point
        if progress >= reference_progress {
            return Some(vehicle.timestamp);
        }

        let trip_secs = self.trip_length_secs(vehicle.trip_id.as_deref()?)?;
        let remaining = (reference_progress - progress) * trip_secs;
        Some(vehicle.timestamp + remaining as i64)
    }
}
