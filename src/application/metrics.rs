//! Deterministic text-quality metrics.
//!
//! Readability is the Flesch reading ease score (higher is easier), complexity
//! is the Flesch-Kincaid grade level. Both are rounded to two decimals. Text
//! without words scores 0.0 on both.

use crate::domain::TextMetrics;
use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("valid regex"));
static VOWEL_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[aeiouy]+").expect("valid regex"));

pub fn analyze(text: &str) -> TextMetrics {
    let words = words(text);
    let word_count = words.len();
    let char_length = text.chars().count();

    if word_count == 0 {
        return TextMetrics {
            readability: 0.0,
            complexity: 0.0,
            char_length,
            word_count: 0,
        };
    }

    let sentences = sentence_count(text).max(1) as f64;
    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();
    let words_per_sentence = word_count as f64 / sentences;
    let syllables_per_word = syllables as f64 / word_count as f64;

    let readability = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    let complexity = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;

    TextMetrics {
        readability: sanitize("readability", readability),
        complexity: sanitize("complexity", complexity),
        char_length,
        word_count,
    }
}

/// Whitespace-separated tokens that contain at least one letter or digit.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .collect()
}

pub fn word_count(text: &str) -> usize {
    words(text).len()
}

fn sentence_count(text: &str) -> usize {
    let terminated = SENTENCE_END.find_iter(text).count();
    // trailing text without a terminator is a sentence too
    let trailing = text
        .rsplit(['.', '!', '?'])
        .next()
        .is_some_and(|tail| tail.chars().any(char::is_alphanumeric));
    terminated + usize::from(trailing)
}

/// Vowel-group heuristic with a silent trailing `e`; at least one per word.
pub fn syllable_count(word: &str) -> usize {
    let letters: String = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if letters.is_empty() {
        return 1;
    }

    let mut count = VOWEL_GROUP.find_iter(&letters).count();
    if count > 1 && letters.ends_with('e') && !letters.ends_with("le") {
        count -= 1;
    }
    count.max(1)
}

/// Number of `**` bold markers.
pub fn bold_marker_count(text: &str) -> usize {
    text.matches("**").count()
}

/// Lines that start with a `- `, `* ` or `•` bullet.
pub fn bullet_line_count(text: &str) -> usize {
    text.lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("- ") || line.starts_with("* ") || line.starts_with('•'))
        .count()
}

/// Number of blank-line paragraph breaks. CRLF line endings count the same as LF.
pub fn paragraph_break_count(text: &str) -> usize {
    text.replace("\r\n", "\n").matches("\n\n").count()
}

fn sanitize(metric: &str, value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        log::warn!("Text metric {metric} was not finite; recording 0.0");
        0.0
    }
}
