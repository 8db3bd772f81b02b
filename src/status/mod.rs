//! Per-vehicle punctuality status for live snapshots.
//!
//! [`VehicleStatusService`] looks up the next stop of each vehicle's trip,
//! reads the realtime delay recorded there, and attaches a status block with
//! label, colour, caption, reason and rider feedback.

pub mod classify;
pub mod reason;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::StatusConfig;
use crate::services::{FeedbackStore, FeedbackSummary, StopTimeProvider};
use crate::types::VehiclePosition;

use classify::{PunctualityLabel, StatusColor, severity_bucket};
use reason::TrafficReasonProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub label: PunctualityLabel,
    pub color: StatusColor,
    pub severity: String,
    pub deviation_sec: i64,
    pub reason: Option<String>,
    pub feedback: FeedbackSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotVehicle {
    #[serde(flatten)]
    pub position: VehiclePosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<VehicleStatus>,
}

impl SnapshotVehicle {
    /// Key used for feedback lookups: the vehicle id, else the trip id.
    pub fn feedback_key(&self) -> Option<&str> {
        self.position
            .vehicle_id
            .as_deref()
            .or(self.position.trip_id.as_deref())
            .filter(|k| !k.is_empty())
    }
}

/// One poll of the live feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub timestamp: Option<i64>,
    pub vehicles: Vec<SnapshotVehicle>,
}

pub struct VehicleStatusService {
    stop_times: Arc<dyn StopTimeProvider>,
    reasons: Arc<dyn TrafficReasonProvider>,
    feedback: Arc<dyn FeedbackStore>,
    past_stop_grace_secs: i64,
    feedback_timeout: Duration,
}

impl VehicleStatusService {
    pub fn new(
        stop_times: Arc<dyn StopTimeProvider>,
        reasons: Arc<dyn TrafficReasonProvider>,
        feedback: Arc<dyn FeedbackStore>,
        config: &StatusConfig,
    ) -> Self {
        Self {
            stop_times,
            reasons,
            feedback,
            past_stop_grace_secs: config.past_stop_grace_secs,
            feedback_timeout: Duration::from_millis(config.feedback_timeout_ms),
        }
    }

    /// Returns the snapshot with a status block on every vehicle whose trip
    /// has a realtime delay at an upcoming stop. Other vehicles pass through.
    pub async fn enrich_snapshot(&self, mut snapshot: Snapshot, now: i64) -> Snapshot {
        let mut enriched = 0usize;

        for vehicle in snapshot.vehicles.iter_mut() {
            let Some(deviation) = self.next_stop_delay(&vehicle.position, now) else {
                continue;
            };

            let feedback = match vehicle.feedback_key() {
                Some(key) => self.feedback_summary(key).await,
                None => FeedbackSummary::default(),
            };

            vehicle.status = Some(self.status_for(&vehicle.position, deviation, feedback));
            enriched += 1;
        }

        debug!(vehicles = snapshot.vehicles.len(), enriched, "Snapshot enriched");
        snapshot
    }

    /// Builds the status block for a known deviation.
    pub fn status_for(
        &self,
        vehicle: &VehiclePosition,
        deviation_sec: i64,
        feedback: FeedbackSummary,
    ) -> VehicleStatus {
        let bucket = severity_bucket(deviation_sec);
        VehicleStatus {
            label: PunctualityLabel::from_deviation(deviation_sec),
            color: bucket.color,
            severity: bucket.severity.to_string(),
            deviation_sec,
            reason: self.reasons.reason_for(vehicle, deviation_sec),
            feedback,
        }
    }

    /// Delay at the first stop not yet passed (allowing a grace period) that carries one.
    pub fn next_stop_delay(&self, vehicle: &VehiclePosition, now: i64) -> Option<i64> {
        let trip_id = vehicle.trip_id.as_deref()?;
        let stop_times = self.stop_times.stop_times_for_trip(trip_id)?;
        let reference = vehicle.timestamp.max(now) - self.past_stop_grace_secs;

        stop_times
            .iter()
            .filter(|st| st.arrival_or_departure().is_some_and(|t| t >= reference))
            .find_map(|st| st.delay)
    }

    /// Feedback counts for a vehicle. Slow or failed reads degrade to zeros.
    async fn feedback_summary(&self, key: &str) -> FeedbackSummary {
        match tokio::time::timeout(self.feedback_timeout, self.feedback.summary(key)).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                warn!(vehicle_id = key, error = %e, "Feedback read failed");
                FeedbackSummary::default()
            }
            Err(_) => {
                warn!(vehicle_id = key, "Feedback read timed out");
                FeedbackSummary::default()
            }
        }
    }
}
