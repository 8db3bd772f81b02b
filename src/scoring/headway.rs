//! Observed headway for a group of same-route vehicles.
//!
//! Three sampling strategies are tried in order, richest data first:
//! predicted arrivals at a shared stop, interpolated crossing times at a
//! reference point, and finally the raw report timestamps. The first strategy
//! that yields at least two timestamps with a positive gap wins, and all of
//! them reduce their samples through the same [`median_headway`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::scoring::utility::median_headway;
use crate::services::{CrossingTimeEstimator, StopTimeProvider};
use crate::types::VehiclePosition;

/// Which strategy produced a headway value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadwaySource {
    SharedStop,
    Interpolated,
    ReportTimestamps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadwayEstimate {
    pub seconds: i64,
    pub source: HeadwaySource,
}

/// One way of turning a vehicle group into comparable timestamps.
pub trait HeadwayStrategy: Send + Sync {
    fn source(&self) -> HeadwaySource;

    /// Timestamps of the vehicles that could contribute, or `None` when fewer than two could.
    fn sample(&self, vehicles: &[VehiclePosition]) -> Option<Vec<i64>>;
}

fn at_least_two(times: Vec<i64>) -> Option<Vec<i64>> {
    (times.len() >= 2).then_some(times)
}

/// Predicted arrivals at the stop shared by the most vehicles.
pub struct SharedStopStrategy {
    stop_times: Arc<dyn StopTimeProvider>,
}

impl SharedStopStrategy {
    pub fn new(stop_times: Arc<dyn StopTimeProvider>) -> Self {
        Self { stop_times }
    }
}

impl HeadwayStrategy for SharedStopStrategy {
    fn source(&self) -> HeadwaySource {
        HeadwaySource::SharedStop
    }

    fn sample(&self, vehicles: &[VehiclePosition]) -> Option<Vec<i64>> {
        // per vehicle: stop_id -> predicted arrival (first visit only)
        let arrivals: Vec<HashMap<String, Option<i64>>> = vehicles
            .iter()
            .filter_map(|v| self.stop_times.stop_times_for_trip(v.trip_id.as_deref()?))
            .map(|stops| {
                let mut by_stop = HashMap::new();
                for st in stops {
                    by_stop.entry(st.stop_id.clone()).or_insert_with(|| st.predicted_arrival());
                }
                by_stop
            })
            .collect();

        if arrivals.len() < 2 {
            return None;
        }

        let mut coverage: HashMap<&str, usize> = HashMap::new();
        for by_stop in &arrivals {
            for (stop_id, time) in by_stop {
                if time.is_some() {
                    *coverage.entry(stop_id.as_str()).or_default() += 1;
                }
            }
        }

        // widest coverage; ties go to the smallest stop id
        let (shared_stop, count) = coverage
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))?;
        if count < 2 {
            return None;
        }

        debug!(stop_id = shared_stop, vehicles = count, "Shared stop selected");

        let times = arrivals
            .iter()
            .filter_map(|by_stop| by_stop.get(shared_stop).copied().flatten())
            .collect();
        at_least_two(times)
    }
}

/// Estimated crossing times at a fixed fraction of each trip.
pub struct InterpolatedStrategy {
    estimator: Arc<dyn CrossingTimeEstimator>,
    reference_progress: f64,
}

impl InterpolatedStrategy {
    pub fn new(estimator: Arc<dyn CrossingTimeEstimator>, reference_progress: f64) -> Self {
        Self {
            estimator,
            reference_progress,
        }
    }
}

impl HeadwayStrategy for InterpolatedStrategy {
    fn source(&self) -> HeadwaySource {
        HeadwaySource::Interpolated
    }

    fn sample(&self, vehicles: &[VehiclePosition]) -> Option<Vec<i64>> {
        let times = vehicles
            .iter()
            .filter_map(|v| self.estimator.estimate_time_at_progress(v, self.reference_progress))
            .collect();
        at_least_two(times)
    }
}

/// Raw `timestamp` of each position report.
pub struct ReportTimestampStrategy;

impl HeadwayStrategy for ReportTimestampStrategy {
    fn source(&self) -> HeadwaySource {
        HeadwaySource::ReportTimestamps
    }

    fn sample(&self, vehicles: &[VehiclePosition]) -> Option<Vec<i64>> {
        at_least_two(vehicles.iter().map(|v| v.timestamp).collect())
    }
}

/// Runs the strategies in order until one produces a headway.
pub struct HeadwayCalculator {
    strategies: Vec<Box<dyn HeadwayStrategy>>,
}

impl HeadwayCalculator {
    pub fn new(strategies: Vec<Box<dyn HeadwayStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard shared-stop, interpolated, report-timestamp chain.
    pub fn standard(
        stop_times: Arc<dyn StopTimeProvider>,
        estimator: Arc<dyn CrossingTimeEstimator>,
        reference_progress: f64,
    ) -> Self {
        Self::new(vec![
            Box::new(SharedStopStrategy::new(stop_times)),
            Box::new(InterpolatedStrategy::new(estimator, reference_progress)),
            Box::new(ReportTimestampStrategy),
        ])
    }

    /// Median headway in seconds for a same-route group, `None` for fewer than two vehicles.
    pub fn observed_headway_seconds(&self, vehicles: &[VehiclePosition]) -> Option<i64> {
        self.estimate(vehicles).map(|e| e.seconds)
    }

    pub fn estimate(&self, vehicles: &[VehiclePosition]) -> Option<HeadwayEstimate> {
        if vehicles.len() < 2 {
            return None;
        }

        self.strategies.iter().find_map(|strategy| {
            let times = strategy.sample(vehicles)?;
            let seconds = median_headway(&times)?;
            Some(HeadwayEstimate {
                seconds,
                source: strategy.source(),
            })
        })
    }
}
