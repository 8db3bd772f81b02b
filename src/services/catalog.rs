//! Trait for looking up routes, stops and trips of the static network.

use crate::error::{RaterError, Result};
use crate::types::{ArrivalPrediction, Route, Stop, Trip};

#[async_trait::async_trait]
pub trait RouteCatalog: Send + Sync {
    /// All routes, in a stable order.
    async fn routes(&self) -> Result<Vec<Route>>;

    async fn find_route(&self, route_id: &str) -> Result<Option<Route>>;

    async fn find_stop(&self, stop_id: &str) -> Result<Option<Stop>>;

    async fn find_trip(&self, trip_id: &str) -> Result<Option<Trip>>;

    /// Checks that a prediction references a known route, stop and trip,
    /// and that the trip belongs to the route.
    async fn validate_prediction(&self, prediction: &ArrivalPrediction) -> Result<()> {
        if self.find_route(&prediction.route_id).await?.is_none() {
            return Err(RaterError::UnknownRoute(prediction.route_id.clone()));
        }
        if self.find_stop(&prediction.stop_id).await?.is_none() {
            return Err(RaterError::UnknownStop(prediction.stop_id.clone()));
        }
        let trip = self
            .find_trip(&prediction.trip_id)
            .await?
            .ok_or_else(|| RaterError::UnknownTrip(prediction.trip_id.clone()))?;
        if trip.route_id != prediction.route_id {
            return Err(RaterError::InvalidPrediction(format!(
                "trip '{}' belongs to route '{}', not '{}'",
                trip.id, trip.route_id, prediction.route_id
            )));
        }
        Ok(())
    }
}
