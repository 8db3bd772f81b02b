//! Arrival-log implementations.
//!
//! [`InMemoryArrivalLog`] keeps rows in a vector. [`FileArrivalLog`] writes one
//! CSV per UTC day under its base directory (`date=YYYY-MM-DD.csv`), keyed on
//! each row's `predicted_at`. Both validate rows against the route catalog
//! before writing.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{RaterError, Result};
use crate::output::append_record;
use crate::services::{ArrivalLog, RouteCatalog};
use crate::types::ArrivalPrediction;

fn utc_date(timestamp: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| RaterError::InvalidPrediction(format!("timestamp {timestamp} out of range")))
}

fn sort_by_predicted_at(rows: &mut [ArrivalPrediction]) {
    rows.sort_by_key(|p| p.predicted_at);
}

pub struct InMemoryArrivalLog {
    catalog: Arc<dyn RouteCatalog>,
    rows: RwLock<Vec<ArrivalPrediction>>,
}

impl InMemoryArrivalLog {
    pub fn new(catalog: Arc<dyn RouteCatalog>) -> Self {
        Self {
            catalog,
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait::async_trait]
impl ArrivalLog for InMemoryArrivalLog {
    async fn predictions_between(&self, start: i64, end: i64) -> Result<Vec<ArrivalPrediction>> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .iter()
            .filter(|p| (start..end).contains(&p.predicted_at))
            .cloned()
            .collect();
        sort_by_predicted_at(&mut rows);
        Ok(rows)
    }

    async fn append(&self, prediction: ArrivalPrediction) -> Result<()> {
        self.catalog.validate_prediction(&prediction).await?;
        self.rows.write().push(prediction);
        Ok(())
    }
}

/// Daily CSV files under `base_dir`.
pub struct FileArrivalLog {
    base_dir: PathBuf,
    catalog: Arc<dyn RouteCatalog>,
}

impl FileArrivalLog {
    pub fn new(base_dir: impl Into<PathBuf>, catalog: Arc<dyn RouteCatalog>) -> Self {
        Self {
            base_dir: base_dir.into(),
            catalog,
        }
    }

    pub fn path_for_date(&self, date: NaiveDate) -> PathBuf {
        self.base_dir.join(format!("date={}.csv", date.format("%Y-%m-%d")))
    }

    /// All rows of one UTC day's file; empty when the file does not exist.
    pub fn load_rows_for_date(&self, date: NaiveDate) -> Result<Vec<ArrivalPrediction>> {
        load_rows(&self.path_for_date(date))
    }
}

fn load_rows(path: &Path) -> Result<Vec<ArrivalPrediction>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: ArrivalPrediction = result?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Arrival CSV loaded");
    Ok(rows)
}

#[async_trait::async_trait]
impl ArrivalLog for FileArrivalLog {
    async fn predictions_between(&self, start: i64, end: i64) -> Result<Vec<ArrivalPrediction>> {
        if end <= start {
            return Ok(Vec::new());
        }

        let first = utc_date(start)?;
        let last = utc_date(end - 1)?;

        let mut rows = Vec::new();
        for date in first.iter_days().take_while(|d| *d <= last) {
            rows.extend(
                self.load_rows_for_date(date)?
                    .into_iter()
                    .filter(|p| (start..end).contains(&p.predicted_at)),
            );
        }
        sort_by_predicted_at(&mut rows);
        Ok(rows)
    }

    async fn append(&self, prediction: ArrivalPrediction) -> Result<()> {
        self.catalog.validate_prediction(&prediction).await?;

        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.path_for_date(utc_date(prediction.predicted_at)?);
        append_record(&path, &prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::catalog::InMemoryCatalog;
    use crate::types::{Confidence, Route, Stop, Trip};

    // 2023-11-14T22:13:20Z
    const T0: i64 = 1_700_000_000;

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::from_parts(
            vec![Route { id: "10".into(), short_name: None }],
            vec![Stop { id: "s1".into(), name: None, lat: 0.0, lon: 0.0 }],
            vec![Trip { id: "t1".into(), route_id: "10".into() }],
        ))
    }

    fn prediction(route: &str, predicted_at: i64) -> ArrivalPrediction {
        ArrivalPrediction {
            vehicle_id: "v1".into(),
            trip_id: "t1".into(),
            route_id: route.into(),
            stop_id: "s1".into(),
            predicted_arrival_at: predicted_at + 60,
            scheduled_arrival_at: Some(predicted_at + 30),
            predicted_at,
            delay_seconds: Some(30),
            confidence: Confidence::Medium,
        }
    }

    #[tokio::test]
    async fn test_in_memory_rejects_invalid_rows() {
        let log = InMemoryArrivalLog::new(catalog());
        log.append(prediction("10", T0)).await.unwrap();

        let err = log.append(prediction("99", T0)).await.unwrap_err();
        assert!(matches!(err, RaterError::UnknownRoute(_)));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_range_is_half_open_and_ordered() {
        let log = InMemoryArrivalLog::new(catalog());
        for at in [T0 + 20, T0, T0 + 10, T0 + 30] {
            log.append(prediction("10", at)).await.unwrap();
        }

        let rows = log.predictions_between(T0, T0 + 30).await.unwrap();
        let times: Vec<_> = rows.iter().map(|p| p.predicted_at).collect();
        assert_eq!(times, vec![T0, T0 + 10, T0 + 20]);
    }

    #[tokio::test]
    async fn test_file_log_round_trips_across_days() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileArrivalLog::new(dir.path(), catalog());

        // T0 + 7200 is past midnight UTC
        log.append(prediction("10", T0)).await.unwrap();
        log.append(prediction("10", T0 + 7_200)).await.unwrap();

        let day1 = NaiveDate::from_ymd_opt(2023, 11, 14).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2023, 11, 15).unwrap();
        assert!(log.path_for_date(day1).exists());
        assert!(log.path_for_date(day2).exists());

        let rows = log.predictions_between(T0 - 10, T0 + 10_000).await.unwrap();
        assert_eq!(rows, vec![prediction("10", T0), prediction("10", T0 + 7_200)]);
    }

    #[tokio::test]
    async fn test_file_log_validates_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileArrivalLog::new(dir.path().join("arrivals"), catalog());

        assert!(log.append(prediction("99", T0)).await.is_err());
        assert!(!dir.path().join("arrivals").exists());
    }

    #[test]
    fn test_missing_day_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileArrivalLog::new(dir.path(), catalog());
        let rows = log.load_rows_for_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        assert!(rows.is_empty());
    }
}
