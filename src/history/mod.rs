//! Daily batch jobs over the persisted arrival log.
//!
//! [`bunching::BunchingDetector`] finds vehicles arriving at the same stop
//! too close together; [`aggregator::PerformanceAggregator`] reduces each
//! route's predictions into one [`RoutePerformanceDaily`](crate::types::RoutePerformanceDaily)
//! row. Both are idempotent per date.

pub mod aggregator;
pub mod bunching;
pub mod metrics;

use chrono::NaiveDate;

const SECONDS_PER_DAY: i64 = 86_400;

/// `[start, end)` of a local calendar day as epoch seconds.
pub fn day_bounds(date: NaiveDate, utc_offset_minutes: i32) -> (i64, i64) {
    let midnight_utc = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
    let start = midnight_utc - i64::from(utc_offset_minutes) * 60;
    (start, start + SECONDS_PER_DAY)
}

/// Local noon of `date`, used to pick the day's representative weather.
pub fn local_noon(date: NaiveDate, utc_offset_minutes: i32) -> i64 {
    day_bounds(date, utc_offset_minutes).0 + SECONDS_PER_DAY / 2
}
