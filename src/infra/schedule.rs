//! Static schedule loaded from a JSON export of stop coordinates and
//! per-trip stop times.
//!
//! ```json
//! {
//!   "stops": [{ "id": "s1", "lat": 45.5, "lon": -73.6 }],
//!   "stop_times": {
//!     "t1": [{ "stop_id": "s1", "sequence": 1, "scheduled_arrival": 1700000000, "delay": 45 }]
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::services::{StopDirectory, StopTimeProvider};
use crate::types::{Stop, StopTimeEntry};

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    stops: Vec<Stop>,
    #[serde(default)]
    stop_times: HashMap<String, Vec<StopTimeEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "ScheduleFile")]
pub struct StaticSchedule {
    stops: HashMap<String, (f64, f64)>,
    trips: HashMap<String, Vec<StopTimeEntry>>,
}

impl From<ScheduleFile> for StaticSchedule {
    fn from(file: ScheduleFile) -> Self {
        let mut schedule = StaticSchedule::default();
        for stop in file.stops {
            schedule.add_stop(&stop.id, stop.lat, stop.lon);
        }
        for (trip_id, entries) in file.stop_times {
            for entry in entries {
                schedule.add_stop_time(&trip_id, entry);
            }
        }
        schedule
    }
}

impl StaticSchedule {
    pub fn add_stop(&mut self, stop_id: &str, lat: f64, lon: f64) {
        self.stops.insert(stop_id.to_string(), (lat, lon));
    }

    /// Adds a stop time, keeping the trip ordered by sequence.
    pub fn add_stop_time(&mut self, trip_id: &str, entry: StopTimeEntry) {
        let entries = self.trips.entry(trip_id.to_string()).or_default();
        let at = entries.partition_point(|e| e.sequence <= entry.sequence);
        entries.insert(at, entry);
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

impl StopTimeProvider for StaticSchedule {
    fn stop_times_for_trip(&self, trip_id: &str) -> Option<Vec<StopTimeEntry>> {
        self.trips.get(trip_id).filter(|e| !e.is_empty()).cloned()
    }
}

impl StopDirectory for StaticSchedule {
    fn stop_location(&self, stop_id: &str) -> Option<(f64, f64)> {
        self.stops.get(stop_id).copied()
    }
}
