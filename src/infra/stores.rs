//! In-memory stores keyed on the natural keys of the batch outputs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::error::Result;
use crate::services::{IncidentStore, PerformanceStore};
use crate::types::{BunchingIncident, RoutePerformanceDaily};

type IncidentKey = (String, String, i64);

#[derive(Debug, Default)]
pub struct InMemoryIncidentStore {
    rows: RwLock<BTreeMap<IncidentKey, BunchingIncident>>,
}

impl InMemoryIncidentStore {
    /// Incidents ordered by route, stop, then detection time.
    pub fn all(&self) -> Vec<BunchingIncident> {
        self.rows.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait::async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn upsert(&self, incident: BunchingIncident) -> Result<()> {
        let key = (
            incident.route_id.clone(),
            incident.stop_id.clone(),
            incident.detected_at,
        );
        self.rows.write().insert(key, incident);
        Ok(())
    }

    async fn count_for_route(&self, route_id: &str, date: NaiveDate) -> Result<usize> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|i| i.route_id == route_id && i.service_date == date)
            .count())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPerformanceStore {
    rows: RwLock<BTreeMap<(String, NaiveDate), RoutePerformanceDaily>>,
}

impl InMemoryPerformanceStore {
    pub fn all(&self) -> Vec<RoutePerformanceDaily> {
        self.rows.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait::async_trait]
impl PerformanceStore for InMemoryPerformanceStore {
    async fn upsert(&self, row: RoutePerformanceDaily) -> Result<()> {
        self.rows.write().insert((row.route_id.clone(), row.date), row);
        Ok(())
    }

    async fn find(&self, route_id: &str, date: NaiveDate) -> Result<Option<RoutePerformanceDaily>> {
        Ok(self.rows.read().get(&(route_id.to_string(), date)).cloned())
    }
}
