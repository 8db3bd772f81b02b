//! Interfaces to the collaborators the scoring core depends on.
//!
//! Concrete implementations live in [`crate::infra`].

pub mod arrival_log;
pub mod catalog;
pub mod feedback;
pub mod stop_times;
pub mod stores;

pub use arrival_log::ArrivalLog;
pub use catalog::RouteCatalog;
pub use feedback::{FeedbackStore, FeedbackSummary};
pub use stop_times::{CompositeStopTimeProvider, CrossingTimeEstimator, StopDirectory, StopTimeProvider};
pub use stores::{IncidentStore, PerformanceStore, WeatherLookup};
