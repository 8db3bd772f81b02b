use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Letter grade for a route's service level.
///
/// `A` through `F` are totally ordered (A best). [`Grade::NotAvailable`] means
/// there was not enough data to grade and sits outside that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotAvailable,
}

/// Upper bound (inclusive, seconds) of observed headway for each grade.
///
/// | Headway     | Grade |
/// |-------------|-------|
/// | <= 600      | A     |
/// | <= 900      | B     |
/// | <= 1200     | C     |
/// | > 1200      | D     |
static HEADWAY_BANDS: &[(i64, Grade)] = &[(600, Grade::A), (900, Grade::B), (1200, Grade::C)];

/// Upper bound (inclusive, seconds) of schedule delay for each grade.
///
/// | Delay       | Grade |
/// |-------------|-------|
/// | <= 60       | A     |
/// | <= 180      | B     |
/// | <= 300      | C     |
/// | <= 600      | D     |
/// | > 600       | F     |
static DELAY_BANDS: &[(i64, Grade)] = &[
    (60, Grade::A),
    (180, Grade::B),
    (300, Grade::C),
    (600, Grade::D),
];

fn band_lookup(value: i64, bands: &[(i64, Grade)], otherwise: Grade) -> Grade {
    bands
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map(|(_, grade)| *grade)
        .unwrap_or(otherwise)
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::NotAvailable => "N/A",
        }
    }

    /// Ordinal position, 0 for `A`. `None` for [`Grade::NotAvailable`].
    pub fn rank(&self) -> Option<u8> {
        match self {
            Grade::A => Some(0),
            Grade::B => Some(1),
            Grade::C => Some(2),
            Grade::D => Some(3),
            Grade::F => Some(4),
            Grade::NotAvailable => None,
        }
    }

    /// Compares two letter grades, `Greater` meaning better service.
    /// Returns `None` when either side is [`Grade::NotAvailable`].
    pub fn compare(&self, other: &Grade) -> Option<Ordering> {
        Some(other.rank()?.cmp(&self.rank()?))
    }

    /// Grades an observed multi-vehicle headway. Never yields `F`.
    pub fn from_headway(observed_headway_sec: i64) -> Grade {
        band_lookup(observed_headway_sec, HEADWAY_BANDS, Grade::D)
    }

    /// Grades a signed schedule delay (positive = late). Early running grades like on-time.
    pub fn from_delay(delay_sec: i64) -> Grade {
        band_lookup(delay_sec, DELAY_BANDS, Grade::F)
    }

    /// Picks the grading rule from what data is available.
    ///
    /// Headway wins when present. A lone vehicle is graded on its delay, or
    /// `C` when it has none. Anything else is [`Grade::NotAvailable`].
    pub fn from_observed(
        observed_headway_sec: Option<i64>,
        vehicle_count: usize,
        delay_sec: Option<i64>,
    ) -> Grade {
        match (observed_headway_sec, vehicle_count, delay_sec) {
            (Some(headway), _, _) => Grade::from_headway(headway),
            (None, 1, Some(delay)) => Grade::from_delay(delay),
            (None, 1, None) => Grade::C,
            _ => Grade::NotAvailable,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How realistic a route's schedule is, from the actual/scheduled travel-time ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleRealismGrade {
    OverScheduled,
    WellScheduled,
    Realistic,
    UnderScheduled,
    SeverelyUnderScheduled,
    InsufficientData,
}

/// Exclusive upper bound of the ratio for each realism grade.
static REALISM_BANDS: &[(f64, ScheduleRealismGrade)] = &[
    (0.85, ScheduleRealismGrade::OverScheduled),
    (0.95, ScheduleRealismGrade::WellScheduled),
    (1.05, ScheduleRealismGrade::Realistic),
    (1.15, ScheduleRealismGrade::UnderScheduled),
];

impl ScheduleRealismGrade {
    pub fn from_ratio(ratio: Option<f64>) -> Self {
        let Some(ratio) = ratio else {
            return ScheduleRealismGrade::InsufficientData;
        };

        REALISM_BANDS
            .iter()
            .find(|(upper, _)| ratio < *upper)
            .map(|(_, grade)| *grade)
            .unwrap_or(ScheduleRealismGrade::SeverelyUnderScheduled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScheduleRealismGrade::OverScheduled => "Over-scheduled",
            ScheduleRealismGrade::WellScheduled => "Well-scheduled",
            ScheduleRealismGrade::Realistic => "Realistic",
            ScheduleRealismGrade::UnderScheduled => "Under-scheduled",
            ScheduleRealismGrade::SeverelyUnderScheduled => "Severely Under-scheduled",
            ScheduleRealismGrade::InsufficientData => "Insufficient Data",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headway_boundaries() {
        assert_eq!(Grade::from_headway(0), Grade::A);
        assert_eq!(Grade::from_headway(600), Grade::A);
        assert_eq!(Grade::from_headway(601), Grade::B);
        assert_eq!(Grade::from_headway(900), Grade::B);
        assert_eq!(Grade::from_headway(901), Grade::C);
        assert_eq!(Grade::from_headway(1200), Grade::C);
        assert_eq!(Grade::from_headway(1201), Grade::D);
        assert_eq!(Grade::from_headway(10_000), Grade::D);
    }

    #[test]
    fn test_delay_boundaries() {
        assert_eq!(Grade::from_delay(-900), Grade::A);
        assert_eq!(Grade::from_delay(60), Grade::A);
        assert_eq!(Grade::from_delay(61), Grade::B);
        assert_eq!(Grade::from_delay(180), Grade::B);
        assert_eq!(Grade::from_delay(181), Grade::C);
        assert_eq!(Grade::from_delay(300), Grade::C);
        assert_eq!(Grade::from_delay(301), Grade::D);
        assert_eq!(Grade::from_delay(600), Grade::D);
        assert_eq!(Grade::from_delay(601), Grade::F);
    }

    #[test]
    fn test_from_observed_rule_order() {
        assert_eq!(Grade::from_observed(Some(700), 3, None), Grade::B);
        // headway takes precedence over delay
        assert_eq!(Grade::from_observed(Some(100), 1, Some(900)), Grade::A);
        assert_eq!(Grade::from_observed(None, 1, Some(200)), Grade::C);
        assert_eq!(Grade::from_observed(None, 1, Some(700)), Grade::F);
        assert_eq!(Grade::from_observed(None, 1, None), Grade::C);
        assert_eq!(Grade::from_observed(None, 0, None), Grade::NotAvailable);
        assert_eq!(Grade::from_observed(None, 4, Some(30)), Grade::NotAvailable);
    }

    #[test]
    fn test_not_available_is_not_comparable() {
        assert_eq!(Grade::A.compare(&Grade::B), Some(Ordering::Greater));
        assert_eq!(Grade::F.compare(&Grade::D), Some(Ordering::Less));
        assert_eq!(Grade::C.compare(&Grade::C), Some(Ordering::Equal));
        assert_eq!(Grade::A.compare(&Grade::NotAvailable), None);
        assert_eq!(Grade::NotAvailable.compare(&Grade::NotAvailable), None);
    }

    #[test]
    fn test_grade_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&Grade::NotAvailable).unwrap(), "\"N/A\"");
        assert_eq!(serde_json::to_string(&Grade::B).unwrap(), "\"B\"");
    }

    #[test]
    fn test_realism_bands() {
        use ScheduleRealismGrade::*;
        assert_eq!(ScheduleRealismGrade::from_ratio(None), InsufficientData);
        assert_eq!(ScheduleRealismGrade::from_ratio(Some(0.80)), OverScheduled);
        assert_eq!(ScheduleRealismGrade::from_ratio(Some(0.85)), WellScheduled);
        assert_eq!(ScheduleRealismGrade::from_ratio(Some(1.0)), Realistic);
        assert_eq!(ScheduleRealismGrade::from_ratio(Some(1.10)), UnderScheduled);
        assert_eq!(ScheduleRealismGrade::from_ratio(Some(1.33)), SeverelyUnderScheduled);
    }
}
