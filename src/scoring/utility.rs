/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Median of a list of integer samples.
///
/// Odd counts return the middle value; even counts return the average of the
/// two central values, truncated toward zero. Every median in the crate goes
/// through here so headway tiers and the daily aggregator round identically.
pub fn median(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2)
    } else {
        Some(sorted[mid])
    }
}

/// Sorts the timestamps and returns the strictly positive gaps between neighbours.
pub fn consecutive_deltas(times: &[i64]) -> Vec<i64> {
    let mut sorted = times.to_vec();
    sorted.sort_unstable();

    sorted
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|delta| *delta > 0)
        .collect()
}

/// Median gap between successive timestamps, or `None` when fewer than two
/// distinct timestamps exist.
pub fn median_headway(times: &[i64]) -> Option<i64> {
    if times.len() < 2 {
        return None;
    }
    median(&consecutive_deltas(times))
}

/// Percentage of `part` over `total`, rounded to two decimals. `None` when `total` is zero.
pub fn pct(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round_to(part as f64 / total as f64 * 100.0, 2))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
