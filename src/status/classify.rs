//! Deviation bucketing for rider-facing vehicle status.

use serde::{Deserialize, Serialize};

/// Coarse punctuality label shown to riders and used for feedback votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunctualityLabel {
    Ahead,
    OnTime,
    Late,
}

impl PunctualityLabel {
    /// `Ahead` below -60s, `Late` above +60s, `OnTime` in between (inclusive).
    pub fn from_deviation(deviation_sec: i64) -> Self {
        match deviation_sec {
            d if d < -60 => PunctualityLabel::Ahead,
            d if d <= 60 => PunctualityLabel::OnTime,
            _ => PunctualityLabel::Late,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ahead" => Some(PunctualityLabel::Ahead),
            "on_time" => Some(PunctualityLabel::OnTime),
            "late" => Some(PunctualityLabel::Late),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
}

/// Colour and caption for a deviation range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityBucket {
    /// Inclusive upper bound in seconds; `None` for the open-ended last bucket.
    pub max_deviation_sec: Option<i64>,
    pub color: StatusColor,
    pub severity: &'static str,
}

/// Ordered from earliest to latest; the first bucket whose bound is not exceeded applies.
pub static SEVERITY_BUCKETS: &[SeverityBucket] = &[
    SeverityBucket {
        max_deviation_sec: Some(-600),
        color: StatusColor::Green,
        severity: "🚀 warp speed",
    },
    SeverityBucket {
        max_deviation_sec: Some(-60),
        color: StatusColor::Blue,
        severity: "🏃 speedy",
    },
    SeverityBucket {
        max_deviation_sec: Some(60),
        color: StatusColor::Yellow,
        severity: "✓ vibing",
    },
    SeverityBucket {
        max_deviation_sec: Some(180),
        color: StatusColor::Orange,
        severity: "🐌 fashionably late",
    },
    SeverityBucket {
        max_deviation_sec: Some(600),
        color: StatusColor::Orange,
        severity: "😬 delayed",
    },
    SeverityBucket {
        max_deviation_sec: None,
        color: StatusColor::Purple,
        severity: "💀 ghost bus",
    },
];

pub fn severity_bucket(deviation_sec: i64) -> &'static SeverityBucket {
    SEVERITY_BUCKETS
        .iter()
        .find(|b| b.max_deviation_sec.is_none_or(|max| deviation_sec <= max))
        .unwrap_or(&SEVERITY_BUCKETS[SEVERITY_BUCKETS.len() - 1])
}
