//! Weather observations and their classified impact on transit service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Snow,
    Rain,
    Showers,
    Thunderstorm,
    Fog,
    Unknown,
}

impl WeatherCondition {
    /// Maps an Open-Meteo WMO weather code to a condition.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => WeatherCondition::Clear,
            1..=3 => WeatherCondition::Cloudy,
            45 | 48 => WeatherCondition::Fog,
            51..=67 => WeatherCondition::Rain,
            71..=77 => WeatherCondition::Snow,
            80..=86 => WeatherCondition::Showers,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Unknown,
        }
    }

    /// Case-insensitive parse, `Unknown` for anything unrecognised.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "clear" => WeatherCondition::Clear,
            "cloudy" => WeatherCondition::Cloudy,
            "snow" => WeatherCondition::Snow,
            "rain" => WeatherCondition::Rain,
            "showers" => WeatherCondition::Showers,
            "thunderstorm" => WeatherCondition::Thunderstorm,
            "fog" => WeatherCondition::Fog,
            _ => WeatherCondition::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitImpact {
    None,
    Minor,
    Moderate,
    Severe,
}

impl TransitImpact {
    pub fn label(&self) -> &'static str {
        match self {
            TransitImpact::None => "No Impact",
            TransitImpact::Minor => "Minor Impact",
            TransitImpact::Moderate => "Moderate Impact",
            TransitImpact::Severe => "Severe Impact",
        }
    }
}

/// Raw measurements used to classify impact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub temperature_celsius: f64,
    pub condition: WeatherCondition,
    pub snowfall_cm: f64,
    pub precipitation_mm: f64,
    pub visibility_m: f64,
    pub wind_speed_kmh: f64,
}

/// Year-round transit impact classification. The first matching tier wins.
pub fn classify_transit_impact(r: &WeatherReading) -> TransitImpact {
    let visibility_km = r.visibility_m / 1000.0;
    let temp = r.temperature_celsius;

    // winter extremes
    if temp < -35.0 || r.snowfall_cm > 15.0 || visibility_km < 0.5 {
        return TransitImpact::Severe;
    }

    // storms, flooding, extreme heat, high winds
    if r.condition == WeatherCondition::Thunderstorm
        || r.precipitation_mm > 25.0
        || temp > 35.0
        || r.wind_speed_kmh > 70.0
    {
        return TransitImpact::Severe;
    }

    if temp < -25.0 || r.snowfall_cm > 5.0 {
        return TransitImpact::Moderate;
    }

    if r.precipitation_mm > 10.0
        || visibility_km < 2.0
        || r.wind_speed_kmh > 50.0
        || r.condition == WeatherCondition::Showers
        || (r.condition == WeatherCondition::Rain && r.precipitation_mm > 5.0)
    {
        return TransitImpact::Moderate;
    }

    if temp < -15.0 || (r.condition == WeatherCondition::Snow && r.snowfall_cm <= 2.0) {
        return TransitImpact::Minor;
    }

    if r.condition == WeatherCondition::Rain
        || r.precipitation_mm > 2.0
        || (temp > 28.0 && temp <= 35.0)
        || r.wind_speed_kmh > 30.0
    {
        return TransitImpact::Minor;
    }

    TransitImpact::None
}

/// A stored weather observation. Linked from incidents and daily rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub observed_at: i64,
    pub temperature_celsius: f64,
    pub condition: WeatherCondition,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
    #[serde(default)]
    pub snowfall_cm: Option<f64>,
    #[serde(default)]
    pub visibility_km: Option<f64>,
    #[serde(default)]
    pub wind_speed_kmh: Option<f64>,
    pub transit_impact: TransitImpact,
}

impl WeatherObservation {
    /// Builds an observation and classifies its impact.
    pub fn from_reading(observed_at: i64, reading: WeatherReading) -> Self {
        Self {
            observed_at,
            temperature_celsius: reading.temperature_celsius,
            condition: reading.condition,
            precipitation_mm: Some(reading.precipitation_mm),
            snowfall_cm: Some(reading.snowfall_cm),
            visibility_km: Some(reading.visibility_m / 1000.0),
            wind_speed_kmh: Some(reading.wind_speed_kmh),
            transit_impact: classify_transit_impact(&reading),
        }
    }
}
