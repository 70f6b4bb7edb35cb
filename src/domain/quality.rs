use super::feedback::{FeedbackId, UserAction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deterministic text metrics computed for a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextMetrics {
    /// Flesch reading ease, higher is easier to read
    pub readability: f64,
    /// Flesch-Kincaid grade level
    pub complexity: f64,
    pub char_length: usize,
    pub word_count: usize,
}

/// Metrics sample stored for one feedback event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetricSample {
    pub id: i64,
    /// Event this sample was derived from; the event may since have been pruned.
    pub feedback_id: FeedbackId,
    pub content_type: String,
    pub user_action: UserAction,
    pub readability_score: f64,
    pub complexity_score: f64,
    pub length_chars: i64,
    pub length_words: i64,
    pub timestamp: String,
}

/// Averages over all samples that share a user action.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionQuality {
    pub avg_readability: f64,
    pub avg_complexity: f64,
    /// Average length in words
    pub avg_length: f64,
    pub avg_char_length: f64,
    pub sample_count: i64,
}

/// Per-action quality averages for one content type.
pub type QualityByAction = BTreeMap<UserAction, ActionQuality>;
