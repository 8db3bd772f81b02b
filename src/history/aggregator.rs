use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AggregationConfig;
use crate::error::Result;
use crate::history::{day_bounds, local_noon};
use crate::scoring::grade::ScheduleRealismGrade;
use crate::scoring::utility::median;
use crate::services::{ArrivalLog, IncidentStore, PerformanceStore, RouteCatalog, WeatherLookup};
use crate::types::{Route, RoutePerformanceDaily};
use crate::weather::WeatherObservation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregationSummary {
    pub success: usize,
    pub failed: usize,
}

/// Reduces each route's predictions for a day into one upserted row.
pub struct PerformanceAggregator {
    arrivals: Arc<dyn ArrivalLog>,
    catalog: Arc<dyn RouteCatalog>,
    incidents: Arc<dyn IncidentStore>,
    performance: Arc<dyn PerformanceStore>,
    weather: Arc<dyn WeatherLookup>,
    config: AggregationConfig,
}

impl PerformanceAggregator {
    pub fn new(
        arrivals: Arc<dyn ArrivalLog>,
        catalog: Arc<dyn RouteCatalog>,
        incidents: Arc<dyn IncidentStore>,
        performance: Arc<dyn PerformanceStore>,
        weather: Arc<dyn WeatherLookup>,
        config: AggregationConfig,
    ) -> Self {
        Self {
            arrivals,
            catalog,
            incidents,
            performance,
            weather,
            config,
        }
    }

    /// Aggregates every route in the catalog for `date`.
    ///
    /// Routes without predictions are skipped and counted nowhere. A failing
    /// route is logged and counted; the remaining routes still run.
    #[tracing::instrument(skip(self))]
    pub async fn aggregate_date(&self, date: NaiveDate) -> Result<AggregationSummary> {
        let noon = local_noon(date, self.config.utc_offset_minutes);
        let weather = match self.weather.find_closest_to(noon).await {
            Ok(w) => w,
            Err(e) => {
                warn!(%date, error = %e, "Weather lookup failed");
                None
            }
        };

        let routes = self.catalog.routes().await?;
        let mut summary = AggregationSummary::default();

        for route in &routes {
            match self.aggregate_route(route, date, weather.as_ref()).await {
                Ok(Some(row)) => {
                    summary.success += 1;
                    info!(
                        route_id = %route.id,
                        route_short_name = route.short_name.as_deref().unwrap_or(""),
                        total_predictions = row.total_predictions,
                        weather = row.weather.as_ref().map_or("none", |w| w.transit_impact.label()),
                        "Aggregated performance for route"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    summary.failed += 1;
                    error!(route_id = %route.id, %date, error = %e, "Failed to aggregate performance for route");
                }
            }
        }

        info!(%date, success = summary.success, failed = summary.failed, "Aggregation complete");
        Ok(summary)
    }

    /// Builds and upserts the row for one route. `None` when the route had no predictions.
    pub async fn aggregate_route(
        &self,
        route: &Route,
        date: NaiveDate,
        weather: Option<&WeatherObservation>,
    ) -> Result<Option<RoutePerformanceDaily>> {
        let (start, end) = day_bounds(date, self.config.utc_offset_minutes);

        let metrics = self
            .arrivals
            .aggregate_metrics(
                &route.id,
                start,
                end,
                self.config.on_time_threshold_secs,
                &self.config.realism_policy(),
            )
            .await?;
        if metrics.total_predictions == 0 {
            return Ok(None);
        }

        let realism = metrics.schedule_realism_ratio;
        let bunching_incidents = self.incidents.count_for_route(&route.id, date).await?;

        let row = RoutePerformanceDaily {
            route_id: route.id.clone(),
            date,
            total_predictions: metrics.total_predictions,
            high_confidence_count: metrics.high_confidence_count,
            medium_confidence_count: metrics.medium_confidence_count,
            low_confidence_count: metrics.low_confidence_count,
            avg_delay_seconds: metrics.avg_delay_seconds,
            median_delay_seconds: median(&metrics.delays),
            on_time_percentage: metrics.on_time_percentage,
            late_percentage: metrics.late_percentage,
            early_percentage: metrics.early_percentage,
            bunching_incidents,
            schedule_realism_ratio: realism,
            schedule_realism_grade: ScheduleRealismGrade::from_ratio(realism),
            weather: weather.cloned(),
        };

        self.performance.upsert(row.clone()).await?;
        Ok(Some(row))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::RaterError;
    use crate::infra::{
        InMemoryArrivalLog, InMemoryCatalog, InMemoryIncidentStore, InMemoryPerformanceStore,
        InMemoryWeather,
    };
    use crate::types::{ArrivalPrediction, BunchingIncident, Confidence, Stop, Trip};

    const T0: i64 = 1_700_000_000;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 11, 14).unwrap()
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::from_parts(
            vec![
                Route { id: "10".into(), short_name: Some("Ten".into()) },
                Route { id: "20".into(), short_name: None },
            ],
            vec![Stop { id: "s1".into(), name: None, lat: 0.0, lon: 0.0 }],
            vec![
                Trip { id: "t10".into(), route_id: "10".into() },
                Trip { id: "t20".into(), route_id: "20".into() },
            ],
        ))
    }

    fn prediction(delay: Option<i64>) -> ArrivalPrediction {
        ArrivalPrediction {
            vehicle_id: "v1".into(),
            trip_id: "t10".into(),
            route_id: "10".into(),
            stop_id: "s1".into(),
            predicted_arrival_at: T0 + 60,
            scheduled_arrival_at: None,
            predicted_at: T0,
            delay_seconds: delay,
            confidence: Confidence::High,
        }
    }

    struct Fixture {
        aggregator: PerformanceAggregator,
        incidents: Arc<InMemoryIncidentStore>,
        performance: Arc<InMemoryPerformanceStore>,
    }

    async fn fixture(delays: &[i64]) -> Fixture {
        let catalog = catalog();
        let log = Arc::new(InMemoryArrivalLog::new(catalog.clone()));
        for d in delays {
            log.append(prediction(Some(*d))).await.unwrap();
        }
        let incidents = Arc::new(InMemoryIncidentStore::default());
        let performance = Arc::new(InMemoryPerformanceStore::default());
        let aggregator = PerformanceAggregator::new(
            log,
            catalog,
            incidents.clone(),
            performance.clone(),
            Arc::new(InMemoryWeather::default()),
            AggregationConfig::default(),
        );
        Fixture { aggregator, incidents, performance }
    }

    #[tokio::test]
    async fn test_odd_median() {
        let f = fixture(&[30, 10, 20]).await;
        let summary = f.aggregator.aggregate_date(date()).await.unwrap();

        // route 20 has no predictions and is skipped without failing
        assert_eq!(summary, AggregationSummary { success: 1, failed: 0 });
        let row = f.performance.find("10", date()).await.unwrap().unwrap();
        assert_eq!(row.median_delay_seconds, Some(20));
        assert_eq!(row.avg_delay_seconds, Some(20));
        assert_eq!(row.on_time_percentage, Some(100.0));
        assert_eq!(row.schedule_realism_ratio, None);
        assert_eq!(row.schedule_realism_grade, ScheduleRealismGrade::InsufficientData);
        assert!(f.performance.find("20", date()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_even_median_and_rerun_overwrites() {
        let f = fixture(&[10, 20, 30, 40]).await;
        f.aggregator.aggregate_date(date()).await.unwrap();
        f.aggregator.aggregate_date(date()).await.unwrap();

        assert_eq!(f.performance.len(), 1);
        let row = f.performance.find("10", date()).await.unwrap().unwrap();
        assert_eq!(row.median_delay_seconds, Some(25));
        assert_eq!(row.total_predictions, 4);
    }

    fn incident(detected_at: i64, service_date: NaiveDate) -> BunchingIncident {
        BunchingIncident {
            route_id: "10".into(),
            stop_id: "s1".into(),
            service_date,
            detected_at,
            vehicle_count: 2,
            time_window_seconds: 120,
            vehicle_ids: vec!["a".into(), "b".into()],
            weather: None,
        }
    }

    #[tokio::test]
    async fn test_bunching_count_follows_detection_day() {
        let f = fixture(&[0]).await;
        // T0 + 7_000 arrives after midnight UTC but came from the 14th's predictions
        for at in [T0, T0 + 600, T0 + 7_000] {
            f.incidents.upsert(incident(at, date())).await.unwrap();
        }
        let next_day = date().succ_opt().unwrap();
        f.incidents.upsert(incident(T0 + 7_100, next_day)).await.unwrap();

        f.aggregator.aggregate_date(date()).await.unwrap();
        let row = f.performance.find("10", date()).await.unwrap().unwrap();
        assert_eq!(row.bunching_incidents, 3);
    }

    struct CountingLog {
        inner: InMemoryArrivalLog,
        route_reads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ArrivalLog for CountingLog {
        async fn predictions_between(&self, start: i64, end: i64) -> Result<Vec<ArrivalPrediction>> {
            self.inner.predictions_between(start, end).await
        }
        async fn append(&self, p: ArrivalPrediction) -> Result<()> {
            self.inner.append(p).await
        }
        async fn predictions_for_route(
            &self,
            route_id: &str,
            start: i64,
            end: i64,
        ) -> Result<Vec<ArrivalPrediction>> {
            self.route_reads.fetch_add(1, Ordering::SeqCst);
            let rows = self.inner.predictions_between(start, end).await?;
            Ok(rows.into_iter().filter(|p| p.route_id == route_id).collect())
        }
    }

    #[tokio::test]
    async fn test_route_rows_are_read_once() {
        let catalog = catalog();
        let inner = InMemoryArrivalLog::new(catalog.clone());
        inner.append(prediction(Some(5))).await.unwrap();
        let log = Arc::new(CountingLog { inner, route_reads: AtomicUsize::new(0) });

        let aggregator = PerformanceAggregator::new(
            log.clone(),
            catalog,
            Arc::new(InMemoryIncidentStore::default()),
            Arc::new(InMemoryPerformanceStore::default()),
            Arc::new(InMemoryWeather::default()),
            AggregationConfig::default(),
        );
        aggregator.aggregate_date(date()).await.unwrap();

        // one read per catalog route, route 20 included
        assert_eq!(log.route_reads.load(Ordering::SeqCst), 2);
    }

    struct FlakyLog {
        inner: InMemoryArrivalLog,
    }

    #[async_trait::async_trait]
    impl ArrivalLog for FlakyLog {
        async fn predictions_between(&self, start: i64, end: i64) -> Result<Vec<ArrivalPrediction>> {
            self.inner.predictions_between(start, end).await
        }
        async fn append(&self, p: ArrivalPrediction) -> Result<()> {
            self.inner.append(p).await
        }
        async fn predictions_for_route(
            &self,
            route_id: &str,
            start: i64,
            end: i64,
        ) -> Result<Vec<ArrivalPrediction>> {
            if route_id == "10" {
                return Err(RaterError::Storage("connection reset".into()));
            }
            let rows = self.inner.predictions_between(start, end).await?;
            Ok(rows.into_iter().filter(|p| p.route_id == route_id).collect())
        }
    }

    #[tokio::test]
    async fn test_route_failure_is_counted_and_batch_continues() {
        let catalog = catalog();
        let inner = InMemoryArrivalLog::new(catalog.clone());
        inner.append(prediction(Some(5))).await.unwrap();
        inner
            .append(ArrivalPrediction {
                trip_id: "t20".into(),
                route_id: "20".into(),
                ..prediction(Some(5))
            })
            .await
            .unwrap();

        let performance = Arc::new(InMemoryPerformanceStore::default());
        let aggregator = PerformanceAggregator::new(
            Arc::new(FlakyLog { inner }),
            catalog,
            Arc::new(InMemoryIncidentStore::default()),
            performance.clone(),
            Arc::new(InMemoryWeather::default()),
            AggregationConfig::default(),
        );

        let summary = aggregator.aggregate_date(date()).await.unwrap();
        assert_eq!(summary, AggregationSummary { success: 1, failed: 1 });
        assert!(performance.find("20", date()).await.unwrap().is_some());
    }
}
