//! Learned stylistic preferences per content type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Dimension a preference is learned along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceKind {
    /// Word count of accepted content
    PreferredLength,
    /// Reading ease of accepted content
    PreferredReadability,
    UsesBold,
    UsesBullets,
    PrefersParagraphs,
    AvoidLongContent,
    AvoidShortContent,
    AvoidTechnical,
    AvoidSimple,
}

impl PreferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreferredLength => "preferred_length",
            Self::PreferredReadability => "preferred_readability",
            Self::UsesBold => "uses_bold",
            Self::UsesBullets => "uses_bullets",
            Self::PrefersParagraphs => "prefers_paragraphs",
            Self::AvoidLongContent => "avoid_long_content",
            Self::AvoidShortContent => "avoid_short_content",
            Self::AvoidTechnical => "avoid_technical",
            Self::AvoidSimple => "avoid_simple",
        }
    }
}

impl fmt::Display for PreferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preferred_length" => Ok(Self::PreferredLength),
            "preferred_readability" => Ok(Self::PreferredReadability),
            "uses_bold" => Ok(Self::UsesBold),
            "uses_bullets" => Ok(Self::UsesBullets),
            "prefers_paragraphs" => Ok(Self::PrefersParagraphs),
            "avoid_long_content" => Ok(Self::AvoidLongContent),
            "avoid_short_content" => Ok(Self::AvoidShortContent),
            "avoid_technical" => Ok(Self::AvoidTechnical),
            "avoid_simple" => Ok(Self::AvoidSimple),
            other => Err(format!("unknown preference type '{other}'")),
        }
    }
}

/// A single observation derived from one feedback event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSignal {
    pub kind: PreferenceKind,
    /// String-encoded observed value ("true", "42", "63.5", ...)
    pub value: String,
}

impl PreferenceSignal {
    pub fn new(kind: PreferenceKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn flag(kind: PreferenceKind) -> Self {
        Self::new(kind, "true")
    }
}

/// Persisted belief about one preference of one content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreference {
    pub content_type: String,
    pub preference_type: PreferenceKind,
    /// Most recently observed value
    pub preference_value: String,
    /// 0.0 - 1.0, grows with each reinforcing observation
    pub confidence_score: f64,
    pub last_updated: String,
}

/// Value/confidence pair returned by preference queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceValue {
    pub value: String,
    pub confidence: f64,
}

impl PreferenceValue {
    pub fn as_number(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn is_true(&self) -> bool {
        self.value.eq_ignore_ascii_case("true")
    }
}

pub type PreferenceMap = BTreeMap<PreferenceKind, PreferenceValue>;

/// Confidence after one more reinforcing observation.
///
/// Rounded to two decimals so repeated steps stay exact (0.3, 0.4, ...).
pub fn reinforced_confidence(current: f64, step: f64, max: f64) -> f64 {
    let next = ((current + step) * 100.0).round() / 100.0;
    next.min(max)
}
