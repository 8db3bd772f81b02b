use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::services::{FeedbackStore, FeedbackSummary};
use crate::status::classify::PunctualityLabel;

/// Process-local vote counters.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    votes: RwLock<HashMap<String, FeedbackSummary>>,
}

#[async_trait::async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn summary(&self, vehicle_id: &str) -> Result<FeedbackSummary> {
        Ok(self.votes.read().get(vehicle_id).copied().unwrap_or_default())
    }

    async fn record_vote(&self, vehicle_id: &str, label: PunctualityLabel) -> Result<FeedbackSummary> {
        let mut votes = self.votes.write();
        let summary = votes.entry(vehicle_id.to_string()).or_default();
        summary.record(label);
        Ok(*summary)
    }
}
