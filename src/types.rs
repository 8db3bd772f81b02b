//! Data types shared by the real-time and batch pipelines.
//!
//! All timestamps are epoch seconds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scoring::grade::ScheduleRealismGrade;
use crate::weather::WeatherObservation;

/// One vehicle from a live position poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    pub route_id: String,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub direction: Option<u8>,
    pub timestamp: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl VehiclePosition {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}

/// A scheduled stop on a trip, optionally carrying a realtime delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTimeEntry {
    pub stop_id: String,
    pub sequence: u32,
    #[serde(default)]
    pub scheduled_arrival: Option<i64>,
    #[serde(default)]
    pub scheduled_departure: Option<i64>,
    #[serde(default)]
    pub delay: Option<i64>,
}

impl StopTimeEntry {
    /// Arrival time, falling back to departure.
    pub fn arrival_or_departure(&self) -> Option<i64> {
        self.scheduled_arrival.or(self.scheduled_departure)
    }

    /// Departure time, falling back to arrival.
    pub fn departure_or_arrival(&self) -> Option<i64> {
        self.scheduled_departure.or(self.scheduled_arrival)
    }

    /// Scheduled arrival shifted by the realtime delay when one is known.
    pub fn predicted_arrival(&self) -> Option<i64> {
        Some(self.arrival_or_departure()? + self.delay.unwrap_or(0))
    }
}

/// How a score or prediction was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One row of the append-only arrival log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalPrediction {
    pub vehicle_id: String,
    pub trip_id: String,
    pub route_id: String,
    pub stop_id: String,
    pub predicted_arrival_at: i64,
    #[serde(default)]
    pub scheduled_arrival_at: Option<i64>,
    pub predicted_at: i64,
    #[serde(default)]
    pub delay_seconds: Option<i64>,
    pub confidence: Confidence,
}

/// Two or more vehicles reaching the same stop within the bunching window.
///
/// `detected_at` is the first predicted arrival of the cluster and may fall
/// after midnight; `service_date` is the day whose predictions produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BunchingIncident {
    pub route_id: String,
    pub stop_id: String,
    pub service_date: NaiveDate,
    pub detected_at: i64,
    pub vehicle_count: usize,
    pub time_window_seconds: i64,
    pub vehicle_ids: Vec<String>,
    pub weather: Option<WeatherObservation>,
}

/// Daily per-route performance, unique on `(route_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePerformanceDaily {
    pub route_id: String,
    pub date: NaiveDate,
    pub total_predictions: usize,
    pub high_confidence_count: usize,
    pub medium_confidence_count: usize,
    pub low_confidence_count: usize,
    pub avg_delay_seconds: Option<i64>,
    pub median_delay_seconds: Option<i64>,
    pub on_time_percentage: Option<f64>,
    pub late_percentage: Option<f64>,
    pub early_percentage: Option<f64>,
    pub bunching_incidents: usize,
    pub schedule_realism_ratio: Option<f64>,
    pub schedule_realism_grade: ScheduleRealismGrade,
    pub weather: Option<WeatherObservation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
}
