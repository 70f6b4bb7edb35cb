//! Running per-content-type aggregates and store-level information.

use super::feedback::UserAction;
use serde::{Deserialize, Serialize};

/// Running aggregate of outcomes for one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub content_type: String,
    pub total_generated: i64,
    pub total_accepted: i64,
    pub total_rejected: i64,
    pub total_edited: i64,
    /// Accepted / generated, 0 when nothing was generated
    pub acceptance_rate: f64,
    /// Weighted running mean in seconds
    pub avg_generation_time: f64,
    pub last_updated: String,
}

impl GenerationStats {
    pub fn empty(content_type: impl Into<String>, now: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            total_generated: 0,
            total_accepted: 0,
            total_rejected: 0,
            total_edited: 0,
            acceptance_rate: 0.0,
            avg_generation_time: 0.0,
            last_updated: now.into(),
        }
    }

    /// Fold one outcome into the aggregate.
    ///
    /// The average is `(old_avg * old_total + sample) / new_total`; a missing
    /// sample still counts towards the total but leaves the average untouched.
    pub fn record(&mut self, action: UserAction, generation_time: Option<f64>, now: &str) {
        let previous_total = self.total_generated;
        self.total_generated += 1;
        match action {
            UserAction::Accept => self.total_accepted += 1,
            UserAction::Edit => self.total_edited += 1,
            UserAction::Reject => self.total_rejected += 1,
        }
        if let Some(sample) = generation_time {
            self.avg_generation_time = (self.avg_generation_time * previous_total as f64
                + sample)
                / self.total_generated as f64;
        }
        self.acceptance_rate = acceptance_rate(self.total_accepted, self.total_generated);
        self.last_updated = now.to_string();
    }
}

pub fn acceptance_rate(accepted: i64, generated: i64) -> f64 {
    if generated > 0 {
        accepted as f64 / generated as f64
    } else {
        0.0
    }
}

/// General information about a feedback store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub database_path: String,
    pub total_feedback_records: i64,
    pub content_types_tracked: i64,
    pub edit_patterns_tracked: i64,
    /// Quality samples are kept when their events are pruned
    pub quality_samples: i64,
    pub earliest_record: Option<String>,
    pub latest_record: Option<String>,
    pub max_records_limit: usize,
}
