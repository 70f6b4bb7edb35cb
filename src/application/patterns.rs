//! Edit pattern mining.
//!
//! Compares generated text with its human-edited version and reports the
//! structural and lexical changes as [`PatternObservation`]s. Descriptions are
//! stable strings so that repeat observations land on the same stored pattern.

use super::metrics::{bold_marker_count, bullet_line_count, paragraph_break_count, word_count};
use crate::domain::{EditType, PatternObservation};
use crate::infra::app_config::MiningThresholds;
use once_cell::sync::Lazy;
use regex::Regex;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeSet;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid regex"));

const FORMATTING_DESCRIPTION: &str = "Adjusted formatting and structure";
const VOCABULARY_ADDED_DESCRIPTION: &str = "Introduced new vocabulary";
const VOCABULARY_REMOVED_DESCRIPTION: &str = "Removed vocabulary from the original";

#[derive(Debug, Clone, Default)]
pub struct EditPatternMiner {
    thresholds: MiningThresholds,
}

impl EditPatternMiner {
    pub fn new(thresholds: MiningThresholds) -> Self {
        Self { thresholds }
    }

    /// Patterns observed when `original` was edited into `edited`.
    pub fn mine(&self, original: &str, edited: &str) -> Vec<PatternObservation> {
        let diff = TextDiff::from_lines(original, edited);
        let changed_lines = diff
            .iter_all_changes()
            .filter(|change| change.tag() != ChangeTag::Equal)
            .count();
        if changed_lines == 0 {
            return Vec::new();
        }
        log::debug!("Mining edit with {changed_lines} changed lines");

        let mut observations = Vec::new();
        observations.extend(self.length_pattern(original, edited));
        observations.extend(formatting_pattern(original, edited));
        observations.extend(self.vocabulary_patterns(original, edited));
        observations
    }

    fn length_pattern(&self, original: &str, edited: &str) -> Option<PatternObservation> {
        let before = word_count(original);
        let after = word_count(edited);
        let delta = before.abs_diff(after);
        if delta <= self.thresholds.length_delta_words {
            return None;
        }

        let approx = approximate(delta, self.thresholds.length_bucket_words);
        let (edit_type, description) = if after > before {
            (
                EditType::LengthIncrease,
                format!("Content expanded by approximately {approx} words"),
            )
        } else {
            (
                EditType::LengthDecrease,
                format!("Content shortened by approximately {approx} words"),
            )
        };

        Some(PatternObservation {
            edit_type,
            description,
            examples: vec![format!("Original: {before} words -> Edited: {after} words")],
        })
    }

    fn vocabulary_patterns(&self, original: &str, edited: &str) -> Vec<PatternObservation> {
        let before = vocabulary(original);
        let after = vocabulary(edited);
        let limit = self.thresholds.max_examples;

        let added: Vec<String> = after.difference(&before).cloned().collect();
        let removed: Vec<String> = before.difference(&after).cloned().collect();

        let mut observations = Vec::new();
        if added.len() > self.thresholds.vocabulary_min_words {
            observations.push(PatternObservation {
                edit_type: EditType::VocabularyAddition,
                description: VOCABULARY_ADDED_DESCRIPTION.to_string(),
                examples: added.into_iter().take(limit).collect(),
            });
        }
        if removed.len() > self.thresholds.vocabulary_min_words {
            observations.push(PatternObservation {
                edit_type: EditType::VocabularyRemoval,
                description: VOCABULARY_REMOVED_DESCRIPTION.to_string(),
                examples: removed.into_iter().take(limit).collect(),
            });
        }
        observations
    }
}

fn formatting_pattern(original: &str, edited: &str) -> Option<PatternObservation> {
    let checks: [(&str, fn(&str) -> usize); 3] = [
        ("bold markers", bold_marker_count),
        ("bullet points", bullet_line_count),
        ("paragraph breaks", paragraph_break_count),
    ];

    let changes: Vec<String> = checks
        .iter()
        .filter_map(|(label, count)| {
            let before = count(original);
            let after = count(edited);
            match after.cmp(&before) {
                std::cmp::Ordering::Greater => Some(format!("Added {label}")),
                std::cmp::Ordering::Less => Some(format!("Removed {label}")),
                std::cmp::Ordering::Equal => None,
            }
        })
        .collect();

    if changes.is_empty() {
        return None;
    }
    Some(PatternObservation {
        edit_type: EditType::Formatting,
        description: FORMATTING_DESCRIPTION.to_string(),
        examples: changes,
    })
}

/// Lowercased distinct words, sorted.
fn vocabulary(text: &str) -> BTreeSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Round `delta` to the nearest multiple of `bucket`, never below one bucket.
fn approximate(delta: usize, bucket: usize) -> usize {
    if bucket == 0 {
        return delta;
    }
    (((delta + bucket / 2) / bucket) * bucket).max(bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, word: &str) -> String {
        vec![word; n].join(" ")
    }

    fn miner() -> EditPatternMiner {
        EditPatternMiner::default()
    }

    #[test]
    fn identical_text_yields_nothing() {
        let text = "Same text.\n\n- with a bullet\n**and bold**";
        assert!(miner().mine(text, text).is_empty());
    }

    #[test]
    fn length_increase_above_threshold() {
        let original = words(10, "alpha");
        let edited = words(30, "alpha");
        let observations = miner().mine(&original, &edited);

        assert_eq!(observations.len(), 1);
        let pattern = &observations[0];
        assert_eq!(pattern.edit_type, EditType::LengthIncrease);
        assert_eq!(
            pattern.description,
            "Content expanded by approximately 20 words"
        );
        assert_eq!(
            pattern.examples,
            vec!["Original: 10 words -> Edited: 30 words"]
        );
    }

    #[test]
    fn length_decrease_and_small_deltas() {
        let observations = miner().mine(&words(40, "beta"), &words(12, "beta"));
        assert_eq!(observations[0].edit_type, EditType::LengthDecrease);
        assert_eq!(
            observations[0].description,
            "Content shortened by approximately 30 words"
        );

        // five words is not more than the threshold
        assert!(miner().mine(&words(10, "beta"), &words(15, "beta")).is_empty());
    }

    #[test]
    fn formatting_changes_are_listed_as_examples() {
        let original = "Intro line\nSecond line";
        let edited = "**Intro** line\n\n- Second line";
        let observations = miner().mine(original, edited);

        let formatting = observations
            .iter()
            .find(|o| o.edit_type == EditType::Formatting)
            .unwrap();
        assert_eq!(formatting.description, FORMATTING_DESCRIPTION);
        assert_eq!(
            formatting.examples,
            vec!["Added bold markers", "Added bullet points", "Added paragraph breaks"]
        );
    }

    #[test]
    fn crlf_paragraph_break_is_a_formatting_change() {
        let observations = miner().mine("One.\r\nTwo.", "One.\r\n\r\nTwo.");

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].edit_type, EditType::Formatting);
        assert_eq!(observations[0].examples, vec!["Added paragraph breaks"]);
    }

    #[test]
    fn vocabulary_addition_and_removal() {
        let original = "the quick brown fox jumps over the lazy dog";
        let edited = "the swift crimson wolf leaps across the lazy dog";
        let observations = miner().mine(original, edited);

        let added = observations
            .iter()
            .find(|o| o.edit_type == EditType::VocabularyAddition)
            .unwrap();
        assert_eq!(
            added.examples,
            vec!["across", "crimson", "leaps", "swift", "wolf"]
        );

        let removed = observations
            .iter()
            .find(|o| o.edit_type == EditType::VocabularyRemoval)
            .unwrap();
        assert_eq!(
            removed.examples,
            vec!["brown", "fox", "jumps", "over", "quick"]
        );
    }

    #[test]
    fn vocabulary_examples_are_capped() {
        let original = "start";
        let edited: String = (0..15).map(|i| format!("word{i:02} ")).collect();
        let observations = miner().mine(original, &edited);

        let added = observations
            .iter()
            .find(|o| o.edit_type == EditType::VocabularyAddition)
            .unwrap();
        assert_eq!(added.examples.len(), 10);
    }

    #[test]
    fn three_new_words_are_not_enough() {
        let observations = miner().mine("one two", "one two three four five");
        assert!(
            observations
                .iter()
                .all(|o| o.edit_type != EditType::VocabularyAddition)
        );
    }

    #[test]
    fn small_length_delta_is_described_at_bucket_granularity() {
        let original = words(10, "alpha");
        let edited = words(16, "alpha");
        let coarse = miner().mine(&original, &edited);
        assert_eq!(
            coarse[0].description,
            "Content expanded by approximately 10 words"
        );

        let exact = EditPatternMiner::new(MiningThresholds {
            length_bucket_words: 1,
            ..MiningThresholds::default()
        });
        let fine = exact.mine(&original, &edited);
        assert_eq!(
            fine[0].description,
            "Content expanded by approximately 6 words"
        );
    }

    #[test]
    fn approximate_rounds_to_bucket() {
        assert_eq!(approximate(20, 10), 20);
        assert_eq!(approximate(24, 10), 20);
        assert_eq!(approximate(25, 10), 30);
        assert_eq!(approximate(6, 10), 10);
        assert_eq!(approximate(7, 0), 7);
    }
}
