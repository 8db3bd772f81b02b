//! Runtime configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) yields a working configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{RaterError, Result};
use crate::history::metrics::RealismPolicy;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeadwayConfig {
    /// Fraction of the trip used as the crossing point for interpolated headways.
    pub reference_progress: f64,
}

impl Default for HeadwayConfig {
    fn default() -> Self {
        Self {
            reference_progress: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Stops passed less than this long ago still count as the next stop.
    pub past_stop_grace_secs: i64,
    pub feedback_timeout_ms: u64,
    /// Chance of replacing a traffic reason with a flavor message.
    pub easter_egg_probability: f64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            past_stop_grace_secs: 90,
            feedback_timeout_ms: 250,
            easter_egg_probability: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BunchingConfig {
    pub time_window_secs: i64,
}

impl Default for BunchingConfig {
    fn default() -> Self {
        Self {
            time_window_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub on_time_threshold_secs: i64,
    pub min_realism_trips: usize,
    pub min_realism_stops: usize,
    /// Offset of the network's local time from UTC, for day bounds and noon.
    pub utc_offset_minutes: i32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            on_time_threshold_secs: 180,
            min_realism_trips: 5,
            min_realism_stops: 3,
            utc_offset_minutes: 0,
        }
    }
}

impl AggregationConfig {
    pub fn realism_policy(&self) -> RealismPolicy {
        RealismPolicy {
            min_trips: self.min_realism_trips,
            min_stops: self.min_realism_stops,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default stderr filter when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaterConfig {
    pub headway: HeadwayConfig,
    pub status: StatusConfig,
    pub bunching: BunchingConfig,
    pub aggregation: AggregationConfig,
    pub logging: LoggingConfig,
}

impl RaterConfig {
    /// Reads and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.headway.reference_progress) {
            return Err(RaterError::Config {
                field: "headway.reference_progress",
                reason: format!("{} is outside [0, 1]", self.headway.reference_progress),
            });
        }
        if !(0.0..=1.0).contains(&self.status.easter_egg_probability) {
            return Err(RaterError::Config {
                field: "status.easter_egg_probability",
                reason: format!("{} is outside [0, 1]", self.status.easter_egg_probability),
            });
        }
        if self.status.past_stop_grace_secs < 0 {
            return Err(RaterError::Config {
                field: "status.past_stop_grace_secs",
                reason: "must not be negative".to_string(),
            });
        }
        if self.bunching.time_window_secs <= 0 {
            return Err(RaterError::Config {
                field: "bunching.time_window_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.aggregation.on_time_threshold_secs < 0 {
            return Err(RaterError::Config {
                field: "aggregation.on_time_threshold_secs",
                reason: "must not be negative".to_string(),
            });
        }
        if self.aggregation.utc_offset_minutes.abs() > 14 * 60 {
            return Err(RaterError::Config {
                field: "aggregation.utc_offset_minutes",
                reason: format!("{} is not a valid UTC offset", self.aggregation.utc_offset_minutes),
            });
        }
        Ok(())
    }

    /// Applies a bunching window given on the command line, then revalidates.
    pub fn with_time_window(mut self, secs: Option<i64>) -> Result<Self> {
        if let Some(secs) = secs {
            self.bunching.time_window_secs = secs;
        }
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = RaterConfig::parse("").unwrap();
        assert_eq!(config, RaterConfig::default());
        assert_eq!(config.bunching.time_window_secs, 120);
        assert_eq!(config.status.past_stop_grace_secs, 90);
        assert_eq!(config.aggregation.realism_policy(), RealismPolicy::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = RaterConfig::parse(
            r#"
            [bunching]
            time_window_secs = 90

            [aggregation]
            utc_offset_minutes = -300

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.bunching.time_window_secs, 90);
        assert_eq!(config.aggregation.utc_offset_minutes, -300);
        assert_eq!(config.aggregation.on_time_threshold_secs, 180);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = RaterConfig::parse("[headway]\nreference_progress = 1.5").unwrap_err();
        assert!(matches!(err, RaterError::Config { field: "headway.reference_progress", .. }));

        let err = RaterConfig::parse("[bunching]\ntime_window_secs = 0").unwrap_err();
        assert!(matches!(err, RaterError::Config { field: "bunching.time_window_secs", .. }));

        let err = RaterConfig::parse("[status]\neaster_egg_probability = -0.1").unwrap_err();
        assert!(matches!(err, RaterError::Config { .. }));
    }

    #[test]
    fn test_time_window_override() {
        let config = RaterConfig::default().with_time_window(Some(45)).unwrap();
        assert_eq!(config.bunching.time_window_secs, 45);

        let kept = RaterConfig::default().with_time_window(None).unwrap();
        assert_eq!(kept.bunching.time_window_secs, 120);

        for bad in [0, -30] {
            let err = RaterConfig::default().with_time_window(Some(bad)).unwrap_err();
            assert!(matches!(err, RaterError::Config { field: "bunching.time_window_secs", .. }));
        }
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        assert!(matches!(RaterConfig::parse("[bunching"), Err(RaterError::Toml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rater.toml");
        std::fs::write(&path, "[status]\nfeedback_timeout_ms = 500\n").unwrap();

        let config = RaterConfig::load(&path).unwrap();
        assert_eq!(config.status.feedback_timeout_ms, 500);
    }
}
