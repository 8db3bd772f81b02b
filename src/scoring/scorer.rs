use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::scoring::adherence::{DelayClass, ScheduleAdherenceCalculator};
use crate::scoring::grade::Grade;
use crate::scoring::headway::{HeadwayCalculator, HeadwaySource};
use crate::types::{Confidence, VehiclePosition};

/// Live score for one route and direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteScore {
    pub route_id: String,
    pub direction: Option<u8>,
    pub observed_headway_sec: Option<i64>,
    pub headway_source: Option<HeadwaySource>,
    pub scheduled_headway_sec: Option<i64>,
    pub delay_sec: Option<i64>,
    pub delay_class: DelayClass,
    pub vehicles: usize,
    pub grade: Grade,
    pub confidence: Confidence,
    pub as_of: i64,
}

pub fn confidence_for(observed: Option<i64>, vehicle_count: usize, delay: Option<i64>) -> Confidence {
    match (observed, vehicle_count, delay) {
        (Some(_), n, _) if n >= 2 => Confidence::High,
        (_, 1, Some(_)) => Confidence::Medium,
        _ => Confidence::Low,
    }
}

/// Groups a poll's vehicles by route and direction and grades each group.
pub struct HeadwayScorer {
    headway: HeadwayCalculator,
    adherence: ScheduleAdherenceCalculator,
}

impl HeadwayScorer {
    pub fn new(headway: HeadwayCalculator, adherence: ScheduleAdherenceCalculator) -> Self {
        Self { headway, adherence }
    }

    /// Scores sorted by route id, then direction.
    pub fn compute(&self, vehicles: &[VehiclePosition], as_of: i64) -> Vec<RouteScore> {
        let mut groups: BTreeMap<(String, Option<u8>), Vec<VehiclePosition>> = BTreeMap::new();
        for v in vehicles {
            groups
                .entry((v.route_id.clone(), v.direction))
                .or_default()
                .push(v.clone());
        }

        groups
            .into_iter()
            .map(|((route_id, direction), group)| {
                let estimate = self.headway.estimate(&group);
                let observed = estimate.map(|e| e.seconds);

                let delay = match (group.as_slice(), observed) {
                    ([only], None) => self.adherence.calculate_delay(only),
                    _ => None,
                };

                let grade = Grade::from_observed(observed, group.len(), delay);
                let confidence = confidence_for(observed, group.len(), delay);

                debug!(
                    route_id = %route_id,
                    vehicles = group.len(),
                    observed,
                    delay,
                    grade = %grade,
                    "Route scored"
                );

                RouteScore {
                    route_id,
                    direction,
                    observed_headway_sec: observed,
                    headway_source: estimate.map(|e| e.source),
                    scheduled_headway_sec: None,
                    delay_sec: delay,
                    delay_class: DelayClass::from_delay(delay),
                    vehicles: group.len(),
                    grade,
                    confidence,
                    as_of,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::schedule::StaticSchedule;
    use crate::services::CrossingTimeEstimator;
    use std::sync::Arc;

    struct ProgressOnly(f64);

    impl CrossingTimeEstimator for ProgressOnly {
        fn estimate_time_at_progress(&self, _: &VehiclePosition, _: f64) -> Option<i64> {
            None
        }
        fn estimate_progress(&self, _: &VehiclePosition) -> Option<f64> {
            Some(self.0)
        }
    }

    fn vehicle(route: &str, dir: u8, trip: Option<&str>, ts: i64) -> VehiclePosition {
        VehiclePosition {
            vehicle_id: None,
            route_id: route.to_string(),
            trip_id: trip.map(str::to_string),
            direction: Some(dir),
            timestamp: ts,
            lat: None,
            lon: None,
        }
    }

    fn scorer() -> HeadwayScorer {
        let mut schedule = StaticSchedule::default();
        for (seq, t) in [(0u32, 1_000i64), (1, 2_000)] {
            schedule.add_stop_time(
                "solo",
                crate::types::StopTimeEntry {
                    stop_id: format!("s{seq}"),
                    sequence: seq,
                    scheduled_arrival: Some(t),
                    scheduled_departure: Some(t),
                    delay: None,
                },
            );
        }
        let schedule = Arc::new(schedule);
        let estimator = Arc::new(ProgressOnly(0.5));
        HeadwayScorer::new(
            HeadwayCalculator::standard(schedule.clone(), estimator.clone(), 0.5),
            ScheduleAdherenceCalculator::new(schedule, estimator),
        )
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(confidence_for(Some(300), 2, None), Confidence::High);
        assert_eq!(confidence_for(None, 1, Some(30)), Confidence::Medium);
        assert_eq!(confidence_for(None, 1, None), Confidence::Low);
        assert_eq!(confidence_for(None, 0, None), Confidence::Low);
    }

    #[test]
    fn test_compute_groups_and_sorts() {
        let vehicles = [
            vehicle("20", 0, None, 1_000),
            vehicle("10", 1, None, 1_000),
            vehicle("10", 0, None, 1_000),
            vehicle("10", 0, None, 1_500),
        ];
        let scores = scorer().compute(&vehicles, 2_000);

        let keys: Vec<_> = scores.iter().map(|s| (s.route_id.as_str(), s.direction)).collect();
        assert_eq!(keys, vec![("10", Some(0)), ("10", Some(1)), ("20", Some(0))]);

        assert_eq!(scores[0].observed_headway_sec, Some(500));
        assert_eq!(scores[0].grade, Grade::A);
        assert_eq!(scores[0].confidence, Confidence::High);
        assert_eq!(scores[0].as_of, 2_000);
    }

    #[test]
    fn test_single_vehicle_graded_on_delay() {
        // halfway through a 1000..2000 trip -> expected 1500, reported 1750
        let scores = scorer().compute(&[vehicle("10", 0, Some("solo"), 1_750)], 2_000);
        assert_eq!(scores[0].delay_sec, Some(250));
        assert_eq!(scores[0].delay_class, DelayClass::Late);
        assert_eq!(scores[0].grade, Grade::C);
        assert_eq!(scores[0].confidence, Confidence::Medium);
    }

    #[test]
    fn test_single_vehicle_without_delay_is_neutral() {
        let scores = scorer().compute(&[vehicle("10", 0, None, 1_750)], 2_000);
        assert_eq!(scores[0].grade, Grade::C);
        assert_eq!(scores[0].confidence, Confidence::Low);
    }
}
