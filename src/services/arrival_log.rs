//! Read surface over the append-only arrival-prediction log.

use crate::error::Result;
use crate::history::metrics::{MetricsBundle, RealismPolicy, schedule_realism_ratio};
use crate::types::ArrivalPrediction;

#[async_trait::async_trait]
pub trait ArrivalLog: Send + Sync {
    /// Rows whose `predicted_at` falls in `[start, end)`, ordered by `predicted_at`.
    async fn predictions_between(&self, start: i64, end: i64) -> Result<Vec<ArrivalPrediction>>;

    /// Appends one row. Implementations validate before writing anything.
    async fn append(&self, prediction: ArrivalPrediction) -> Result<()>;

    async fn predictions_for_route(
        &self,
        route_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<ArrivalPrediction>> {
        Ok(self
            .predictions_between(start, end)
            .await?
            .into_iter()
            .filter(|p| p.route_id == route_id)
            .collect())
    }

    /// Aggregation entry point for the daily performance job. The route's
    /// rows are read once and feed both the counts and the realism ratio.
    async fn aggregate_metrics(
        &self,
        route_id: &str,
        start: i64,
        end: i64,
        on_time_threshold_secs: i64,
        policy: &RealismPolicy,
    ) -> Result<MetricsBundle> {
        let rows = self.predictions_for_route(route_id, start, end).await?;
        let mut bundle = MetricsBundle::from_predictions(&rows, on_time_threshold_secs);
        bundle.schedule_realism_ratio = schedule_realism_ratio(&rows, policy);
        Ok(bundle)
    }
}
