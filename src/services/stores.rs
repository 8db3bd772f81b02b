//! Persistence seams for the daily batch outputs.

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{BunchingIncident, RoutePerformanceDaily};
use crate::weather::WeatherObservation;

/// Incidents are unique on `(route_id, stop_id, detected_at)`.
#[async_trait::async_trait]
pub trait IncidentStore: Send + Sync {
    /// Inserts the incident, replacing any row with the same natural key.
    async fn upsert(&self, incident: BunchingIncident) -> Result<()>;

    /// Number of incidents for the route produced by the detection run for `date`.
    async fn count_for_route(&self, route_id: &str, date: NaiveDate) -> Result<usize>;
}

/// Daily rows are unique on `(route_id, date)`.
#[async_trait::async_trait]
pub trait PerformanceStore: Send + Sync {
    /// Writes the row atomically, overwriting an existing row for the same key.
    async fn upsert(&self, row: RoutePerformanceDaily) -> Result<()>;

    async fn find(&self, route_id: &str, date: NaiveDate) -> Result<Option<RoutePerformanceDaily>>;
}

#[async_trait::async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Observation nearest in absolute time to `timestamp`.
    async fn find_closest_to(&self, timestamp: i64) -> Result<Option<WeatherObservation>>;
}
