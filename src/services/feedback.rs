use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::status::classify::PunctualityLabel;

/// Crowd-sourced punctuality votes for one vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    pub ahead: u64,
    pub on_time: u64,
    pub late: u64,
    pub total: u64,
}

impl FeedbackSummary {
    pub fn record(&mut self, label: PunctualityLabel) {
        match label {
            PunctualityLabel::Ahead => self.ahead += 1,
            PunctualityLabel::OnTime => self.on_time += 1,
            PunctualityLabel::Late => self.late += 1,
        }
        self.total += 1;
    }
}

/// Storage of rider feedback votes, keyed by vehicle id.
#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Returns the vote counts; an unknown vehicle yields all zeros.
    async fn summary(&self, vehicle_id: &str) -> Result<FeedbackSummary>;

    async fn record_vote(&self, vehicle_id: &str, label: PunctualityLabel) -> Result<FeedbackSummary>;
}
