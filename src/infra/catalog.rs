//! Route catalog held in memory, loaded from a JSON file:
//!
//! ```json
//! {
//!   "routes": [{ "id": "10", "short_name": "10" }],
//!   "stops": [{ "id": "s1", "name": "Main St", "lat": 45.5, "lon": -73.6 }],
//!   "trips": [{ "id": "t1", "route_id": "10" }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::Result;
use crate::services::RouteCatalog;
use crate::types::{Route, Stop, Trip};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    stops: Vec<Stop>,
    #[serde(default)]
    trips: Vec<Trip>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "CatalogFile")]
pub struct InMemoryCatalog {
    routes: BTreeMap<String, Route>,
    stops: HashMap<String, Stop>,
    trips: HashMap<String, Trip>,
}

impl From<CatalogFile> for InMemoryCatalog {
    fn from(file: CatalogFile) -> Self {
        Self::from_parts(file.routes, file.stops, file.trips)
    }
}

impl InMemoryCatalog {
    pub fn from_parts(routes: Vec<Route>, stops: Vec<Stop>, trips: Vec<Trip>) -> Self {
        Self {
            routes: routes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            stops: stops.into_iter().map(|s| (s.id.clone(), s)).collect(),
            trips: trips.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl RouteCatalog for InMemoryCatalog {
    async fn routes(&self) -> Result<Vec<Route>> {
        Ok(self.routes.values().cloned().collect())
    }

    async fn find_route(&self, route_id: &str) -> Result<Option<Route>> {
        Ok(self.routes.get(route_id).cloned())
    }

    async fn find_stop(&self, stop_id: &str) -> Result<Option<Stop>> {
        Ok(self.stops.get(stop_id).cloned())
    }

    async fn find_trip(&self, trip_id: &str) -> Result<Option<Trip>> {
        Ok(self.trips.get(trip_id).cloned())
    }
}
