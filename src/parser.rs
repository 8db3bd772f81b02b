//! JSON decoders for the CLI inputs.

use crate::error::Result;
use crate::infra::{InMemoryCatalog, StaticSchedule};
use crate::status::Snapshot;
use crate::weather::WeatherObservation;

/// Decodes a live vehicle snapshot.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON object with a `vehicles` array.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes stop coordinates and per-trip stop times.
pub fn parse_schedule(bytes: &[u8]) -> Result<StaticSchedule> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes routes, stops and trips.
pub fn parse_catalog(bytes: &[u8]) -> Result<InMemoryCatalog> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes a JSON array of weather observations.
pub fn parse_weather(bytes: &[u8]) -> Result<Vec<WeatherObservation>> {
    Ok(serde_json::from_slice(bytes)?)
}
