//! Bunching detection over a day's arrival predictions.
//!
//! Predictions are partitioned by `(route_id, stop_id)` and ordered by
//! predicted arrival. Each prediction is compared with its immediate
//! predecessor: a different vehicle with a gap in `(0, time_window_secs]` is a
//! bunching pair. Consecutive pairs chain into one cluster, and a gap wider
//! than the window closes it. Clusters with two or more distinct vehicles
//! become incidents.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{RaterError, Result};
use crate::history::day_bounds;
use crate::services::{ArrivalLog, IncidentStore, RouteCatalog, WeatherLookup};
use crate::types::{ArrivalPrediction, BunchingIncident};

pub const DEFAULT_TIME_WINDOW_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BunchingSummary {
    pub detected: usize,
    pub skipped: usize,
}

/// A run of close arrivals at one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub route_id: String,
    pub stop_id: String,
    pub first_arrival: i64,
    pub last_arrival: i64,
    pub vehicle_ids: Vec<String>,
}

impl Cluster {
    fn open(p: &ArrivalPrediction) -> Self {
        Self {
            route_id: p.route_id.clone(),
            stop_id: p.stop_id.clone(),
            first_arrival: p.predicted_arrival_at,
            last_arrival: p.predicted_arrival_at,
            vehicle_ids: vec![p.vehicle_id.clone()],
        }
    }

    fn is_bunched(&self) -> bool {
        self.vehicle_ids.len() >= 2
    }
}

/// Groups predictions into clusters; only clusters with two or more vehicles are returned.
pub fn find_clusters(rows: &[ArrivalPrediction], time_window_secs: i64) -> Vec<Cluster> {
    let mut partitions: BTreeMap<(&str, &str), Vec<&ArrivalPrediction>> = BTreeMap::new();
    for row in rows {
        partitions
            .entry((row.route_id.as_str(), row.stop_id.as_str()))
            .or_default()
            .push(row);
    }

    let mut clusters = Vec::new();

    for (_, mut arrivals) in partitions {
        arrivals.sort_by(|a, b| {
            a.predicted_arrival_at
                .cmp(&b.predicted_arrival_at)
                .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
        });

        let mut current: Option<Cluster> = None;
        let mut prev: Option<&ArrivalPrediction> = None;

        for p in arrivals {
            let Some(before) = prev.replace(p) else {
                continue;
            };
            let gap = p.predicted_arrival_at - before.predicted_arrival_at;

            if gap > time_window_secs {
                clusters.extend(current.take().filter(Cluster::is_bunched));
                continue;
            }
            // repeat rows of one vehicle and out-of-order ties only move the predecessor
            if gap <= 0 || p.vehicle_id == before.vehicle_id {
                continue;
            }

            let cluster = current.get_or_insert_with(|| Cluster::open(before));
            if !cluster.vehicle_ids.contains(&p.vehicle_id) {
                cluster.vehicle_ids.push(p.vehicle_id.clone());
            }
            cluster.last_arrival = p.predicted_arrival_at;
        }

        clusters.extend(current.filter(Cluster::is_bunched));
    }

    clusters
}

pub struct BunchingDetector {
    arrivals: Arc<dyn ArrivalLog>,
    catalog: Arc<dyn RouteCatalog>,
    incidents: Arc<dyn IncidentStore>,
    weather: Arc<dyn WeatherLookup>,
    time_window_secs: i64,
    utc_offset_minutes: i32,
}

impl BunchingDetector {
    pub fn new(
        arrivals: Arc<dyn ArrivalLog>,
        catalog: Arc<dyn RouteCatalog>,
        incidents: Arc<dyn IncidentStore>,
        weather: Arc<dyn WeatherLookup>,
    ) -> Self {
        Self {
            arrivals,
            catalog,
            incidents,
            weather,
            time_window_secs: DEFAULT_TIME_WINDOW_SECS,
            utc_offset_minutes: 0,
        }
    }

    pub fn with_time_window(mut self, secs: i64) -> Self {
        self.time_window_secs = secs;
        self
    }

    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Detects and persists incidents for one day.
    ///
    /// A cluster whose route or stop is unknown, or whose write fails, is
    /// counted as skipped. Only a failure to read the log aborts the run.
    #[tracing::instrument(skip(self), fields(time_window = self.time_window_secs))]
    pub async fn detect_for_date(&self, date: NaiveDate) -> Result<BunchingSummary> {
        let (start, end) = day_bounds(date, self.utc_offset_minutes);
        info!(%date, time_window_seconds = self.time_window_secs, "Starting bunching detection");

        let rows = self.arrivals.predictions_between(start, end).await?;
        let clusters = find_clusters(&rows, self.time_window_secs);

        let mut summary = BunchingSummary::default();

        for cluster in clusters {
            match self.persist(cluster, date).await {
                Ok(()) => summary.detected += 1,
                Err(e @ (RaterError::UnknownRoute(_) | RaterError::UnknownStop(_))) => {
                    warn!(error = %e, "Route or stop not found for bunching cluster");
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(error = %e, "Failed to persist bunching incident");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            %date,
            predictions = rows.len(),
            detected = summary.detected,
            skipped = summary.skipped,
            "Bunching detection completed"
        );
        Ok(summary)
    }

    async fn persist(&self, cluster: Cluster, date: NaiveDate) -> Result<()> {
        if self.catalog.find_route(&cluster.route_id).await?.is_none() {
            return Err(RaterError::UnknownRoute(cluster.route_id));
        }
        if self.catalog.find_stop(&cluster.stop_id).await?.is_none() {
            return Err(RaterError::UnknownStop(cluster.stop_id));
        }

        let weather = match self.weather.find_closest_to(cluster.first_arrival).await {
            Ok(w) => w,
            Err(e) => {
                warn!(route_id = %cluster.route_id, error = %e, "Weather lookup failed");
                None
            }
        };

        self.incidents
            .upsert(BunchingIncident {
                route_id: cluster.route_id,
                stop_id: cluster.stop_id,
                service_date: date,
                detected_at: cluster.first_arrival,
                vehicle_count: cluster.vehicle_ids.len(),
                time_window_seconds: self.time_window_secs,
                vehicle_ids: cluster.vehicle_ids,
                weather,
            })
            .await
    }
}
