//! Per-route reductions over a day's arrival predictions.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::scoring::utility::{mean, pct, round_to};
use crate::types::{ArrivalPrediction, Confidence};

/// Counts and percentages for one route over a time range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsBundle {
    pub total_predictions: usize,
    pub high_confidence_count: usize,
    pub medium_confidence_count: usize,
    pub low_confidence_count: usize,
    pub avg_delay_seconds: Option<i64>,
    pub on_time_count: usize,
    pub late_count: usize,
    pub early_count: usize,
    pub on_time_percentage: Option<f64>,
    pub late_percentage: Option<f64>,
    pub early_percentage: Option<f64>,
    /// Every non-null delay, in log order.
    pub delays: Vec<i64>,
    /// See [`schedule_realism_ratio`].
    pub schedule_realism_ratio: Option<f64>,
}

impl MetricsBundle {
    /// `on_time_threshold_secs` is inclusive on both sides. Percentages are
    /// over predictions that carry a delay.
    pub fn from_predictions(rows: &[ArrivalPrediction], on_time_threshold_secs: i64) -> Self {
        let mut bundle = MetricsBundle {
            total_predictions: rows.len(),
            ..Default::default()
        };

        for row in rows {
            match row.confidence {
                Confidence::High => bundle.high_confidence_count += 1,
                Confidence::Medium => bundle.medium_confidence_count += 1,
                Confidence::Low => bundle.low_confidence_count += 1,
            }

            let Some(delay) = row.delay_seconds else {
                continue;
            };
            bundle.delays.push(delay);

            if delay > on_time_threshold_secs {
                bundle.late_count += 1;
            } else if delay < -on_time_threshold_secs {
                bundle.early_count += 1;
            } else {
                bundle.on_time_count += 1;
            }
        }

        let with_delay = bundle.delays.len();
        bundle.avg_delay_seconds = mean(&bundle.delays).map(|m| m.round() as i64);
        bundle.on_time_percentage = pct(bundle.on_time_count, with_delay);
        bundle.late_percentage = pct(bundle.late_count, with_delay);
        bundle.early_percentage = pct(bundle.early_count, with_delay);
        bundle
    }
}

/// Minimum evidence for a schedule-realism ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealismPolicy {
    pub min_trips: usize,
    pub min_stops: usize,
}

impl Default for RealismPolicy {
    fn default() -> Self {
        Self {
            min_trips: 5,
            min_stops: 3,
        }
    }
}

#[derive(Default)]
struct TripSpan {
    stops: BTreeSet<String>,
    predicted: Option<(i64, i64)>,
    scheduled: Option<(i64, i64)>,
}

fn widen(span: &mut Option<(i64, i64)>, t: i64) {
    *span = Some(match *span {
        Some((lo, hi)) => (lo.min(t), hi.max(t)),
        None => (t, t),
    });
}

/// Mean over trips of observed travel time divided by scheduled travel time,
/// rounded to three decimals.
///
/// Only rows with a scheduled arrival count. A trip qualifies with at least
/// `min_stops` distinct stops and a positive scheduled span; `None` when fewer
/// than `min_trips` trips qualify.
pub fn schedule_realism_ratio(rows: &[ArrivalPrediction], policy: &RealismPolicy) -> Option<f64> {
    let mut trips: BTreeMap<&str, TripSpan> = BTreeMap::new();

    for row in rows {
        let Some(scheduled) = row.scheduled_arrival_at else {
            continue;
        };
        let span = trips.entry(row.trip_id.as_str()).or_default();
        span.stops.insert(row.stop_id.clone());
        widen(&mut span.predicted, row.predicted_arrival_at);
        widen(&mut span.scheduled, scheduled);
    }

    let ratios: Vec<f64> = trips
        .values()
        .filter(|t| t.stops.len() >= policy.min_stops)
        .filter_map(|t| {
            let (p_lo, p_hi) = t.predicted?;
            let (s_lo, s_hi) = t.scheduled?;
            let scheduled = s_hi - s_lo;
            (scheduled > 0).then(|| (p_hi - p_lo) as f64 / scheduled as f64)
        })
        .collect();

    if ratios.is_empty() || ratios.len() < policy.min_trips {
        return None;
    }

    let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
    Some(round_to(avg, 3))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(trip: &str, stop: &str, delay: Option<i64>, confidence: Confidence) -> ArrivalPrediction {
        ArrivalPrediction {
            vehicle_id: "v".into(),
            trip_id: trip.into(),
            route_id: "10".into(),
            stop_id: stop.into(),
            predicted_arrival_at: 0,
            scheduled_arrival_at: None,
            predicted_at: 0,
            delay_seconds: delay,
            confidence,
        }
    }

    #[test]
    fn test_bundle_counts_and_percentages() {
        let rows = vec![
            row("t", "s", Some(-200), Confidence::High),
            row("t", "s", Some(-180), Confidence::High),
            row("t", "s", Some(180), Confidence::Medium),
            row("t", "s", Some(181), Confidence::Low),
            row("t", "s", None, Confidence::Low),
        ];
        let b = MetricsBundle::from_predictions(&rows, 180);

        assert_eq!(b.total_predictions, 5);
        assert_eq!(
            (b.high_confidence_count, b.medium_confidence_count, b.low_confidence_count),
            (2, 1, 2)
        );
        assert_eq!((b.early_count, b.on_time_count, b.late_count), (1, 2, 1));
        assert_eq!(b.on_time_percentage, Some(50.0));
        assert_eq!(b.early_percentage, Some(25.0));
        assert_eq!(b.late_percentage, Some(25.0));
        // (-200 - 180 + 180 + 181) / 4 = -4.75
        assert_eq!(b.avg_delay_seconds, Some(-5));
        assert_eq!(b.delays, vec![-200, -180, 180, 181]);
    }

    #[test]
    fn test_bundle_without_delays_has_no_percentages() {
        let b = MetricsBundle::from_predictions(&[row("t", "s", None, Confidence::Low)], 180);
        assert_eq!(b.total_predictions, 1);
        assert_eq!(b.on_time_percentage, None);
        assert_eq!(b.avg_delay_seconds, None);
        assert!(b.delays.is_empty());
    }

    #[test]
    fn test_percentages_round_to_two_decimals() {
        let rows = vec![
            row("t", "s", Some(0), Confidence::High),
            row("t", "s", Some(0), Confidence::High),
            row("t", "s", Some(999), Confidence::High),
        ];
        let b = MetricsBundle::from_predictions(&rows, 180);
        assert_eq!(b.on_time_percentage, Some(66.67));
        assert_eq!(b.late_percentage, Some(33.33));
    }

    fn timed(trip: &str, stop: &str, predicted: i64, scheduled: Option<i64>) -> ArrivalPrediction {
        ArrivalPrediction {
            predicted_arrival_at: predicted,
            scheduled_arrival_at: scheduled,
            ..row(trip, stop, None, Confidence::Medium)
        }
    }

    /// Three stops scheduled at 0/300/600, observed over `observed_span` seconds.
    fn trip_rows(trip: &str, observed_span: i64) -> Vec<ArrivalPrediction> {
        ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, stop)| {
                let i = i as i64;
                timed(trip, stop, observed_span * i / 2, Some(300 * i))
            })
            .collect()
    }

    #[test]
    fn test_realism_ratio_mean_over_trips() {
        let mut rows = Vec::new();
        for (i, span) in [600, 600, 660, 720, 600].into_iter().enumerate() {
            rows.extend(trip_rows(&format!("t{i}"), span));
        }
        // (1 + 1 + 1.1 + 1.2 + 1) / 5
        assert_eq!(schedule_realism_ratio(&rows, &RealismPolicy::default()), Some(1.06));
    }

    #[test]
    fn test_realism_needs_five_trips() {
        let mut rows = Vec::new();
        for i in 0..4 {
            rows.extend(trip_rows(&format!("t{i}"), 600));
        }
        assert_eq!(schedule_realism_ratio(&rows, &RealismPolicy::default()), None);
    }

    #[test]
    fn test_realism_ignores_short_and_unscheduled_trips() {
        let mut rows = Vec::new();
        for i in 0..5 {
            rows.extend(trip_rows(&format!("t{i}"), 540));
        }
        // two stops only
        rows.push(timed("short", "a", 0, Some(0)));
        rows.push(timed("short", "b", 9_000, Some(100)));
        // no scheduled arrivals at all
        for stop in ["a", "b", "c"] {
            rows.push(timed("nosched", stop, 5_000, None));
        }
        // zero scheduled span
        for stop in ["a", "b", "c"] {
            rows.push(timed("flat", stop, 5_000, Some(10)));
        }

        assert_eq!(schedule_realism_ratio(&rows, &RealismPolicy::default()), Some(0.9));
    }
}
