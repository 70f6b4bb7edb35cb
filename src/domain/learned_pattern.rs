//! Edit patterns mined from human edits of generated content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of a structural or lexical edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    LengthIncrease,
    LengthDecrease,
    Formatting,
    VocabularyAddition,
    VocabularyRemoval,
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthIncrease => write!(f, "length_increase"),
            Self::LengthDecrease => write!(f, "length_decrease"),
            Self::Formatting => write!(f, "formatting"),
            Self::VocabularyAddition => write!(f, "vocabulary_addition"),
            Self::VocabularyRemoval => write!(f, "vocabulary_removal"),
        }
    }
}

impl FromStr for EditType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length_increase" => Ok(Self::LengthIncrease),
            "length_decrease" => Ok(Self::LengthDecrease),
            "formatting" => Ok(Self::Formatting),
            "vocabulary_addition" => Ok(Self::VocabularyAddition),
            "vocabulary_removal" => Ok(Self::VocabularyRemoval),
            other => Err(format!("unknown edit type '{other}'")),
        }
    }
}

/// A pattern observed in a single edit, before it is merged into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternObservation {
    pub edit_type: EditType,
    pub description: String,
    pub examples: Vec<String>,
}

/// A recurring edit pattern, unique per (content type, edit type, description).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPattern {
    pub id: i64,
    pub content_type: String,
    pub edit_type: EditType,
    pub description: String,
    /// Number of times the pattern has been observed
    pub frequency: i64,
    /// Short illustrative strings, oldest first
    pub examples: Vec<String>,
    pub last_seen: String,
}

/// Merge new examples into an existing list: keeps first-seen order, skips
/// duplicates and drops the oldest entries beyond `cap`.
pub fn merge_examples(existing: &[String], incoming: &[String], cap: usize) -> Vec<String> {
    let mut merged: Vec<String> = existing.to_vec();
    for example in incoming {
        if !merged.contains(example) {
            merged.push(example.clone());
        }
    }
    if merged.len() > cap {
        merged.drain(..merged.len() - cap);
    }
    merged
}
