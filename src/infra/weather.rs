use crate::error::Result;
use crate::services::WeatherLookup;
use crate::weather::WeatherObservation;

/// Observations kept sorted by time; lookups pick the nearest one.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWeather {
    observations: Vec<WeatherObservation>,
}

impl InMemoryWeather {
    pub fn new(mut observations: Vec<WeatherObservation>) -> Self {
        observations.sort_by_key(|o| o.observed_at);
        Self { observations }
    }
}

#[async_trait::async_trait]
impl WeatherLookup for InMemoryWeather {
    async fn find_closest_to(&self, timestamp: i64) -> Result<Option<WeatherObservation>> {
        // earliest wins on equal distance
        Ok(self
            .observations
            .iter()
            .min_by_key(|o| (o.observed_at - timestamp).abs())
            .cloned())
    }
}
