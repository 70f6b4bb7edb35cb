use super::learned_pattern::EditPattern;
use super::preference::PreferenceMap;
use super::quality::QualityByAction;
use super::stats::GenerationStats;
use serde::{Deserialize, Serialize};

/// Everything the store has learned about one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningInsights {
    pub content_type: String,
    pub stats: Option<GenerationStats>,
    pub patterns: Vec<EditPattern>,
    pub quality: QualityByAction,
    pub preferences: PreferenceMap,
    /// Human-readable, heuristic recommendations
    pub recommendations: Vec<String>,
}
