//! Concrete implementations of the [`crate::services`] traits.
//!
//! Everything here is in-memory or file-backed; production deployments swap
//! in their own database-backed implementations behind the same traits.

pub mod arrival_log;
pub mod catalog;
pub mod feedback;
pub mod schedule;
pub mod stores;
pub mod weather;

pub use arrival_log::{FileArrivalLog, InMemoryArrivalLog};
pub use catalog::InMemoryCatalog;
pub use feedback::InMemoryFeedbackStore;
pub use schedule::StaticSchedule;
pub use stores::{InMemoryIncidentStore, InMemoryPerformanceStore};
pub use weather::InMemoryWeather;
