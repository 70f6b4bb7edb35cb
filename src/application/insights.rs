//! Insight synthesis: heuristic recommendations and prompt guidance lines
//! derived from quality samples, edit patterns and learned preferences.

use crate::domain::{EditPattern, PreferenceKind, PreferenceMap, QualityByAction, UserAction};

pub const RECOMMENDATION_MIN_PATTERN_FREQUENCY: i64 = 3;
pub const RECOMMENDATION_MAX_PATTERNS: usize = 3;
pub const STRONG_PREFERENCE_CONFIDENCE: f64 = 0.7;

pub const GUIDANCE_MIN_CONFIDENCE: f64 = 0.4;
pub const GUIDANCE_MIN_PATTERN_FREQUENCY: i64 = 2;
pub const GUIDANCE_MAX_PATTERNS: usize = 2;

const ACCESSIBLE_READABILITY: f64 = 60.0;
const SOPHISTICATED_READABILITY: f64 = 40.0;

/// Human-readable recommendations, most specific first.
///
/// `patterns` is expected most frequent first.
pub fn recommendations(
    quality: &QualityByAction,
    patterns: &[EditPattern],
    preferences: &PreferenceMap,
) -> Vec<String> {
    let mut out = Vec::new();

    if let (Some(accepted), Some(rejected)) = (
        quality.get(&UserAction::Accept),
        quality.get(&UserAction::Reject),
    ) {
        if accepted.avg_readability > rejected.avg_readability {
            out.push(format!(
                "User prefers more readable content (readability ~{:.0})",
                accepted.avg_readability
            ));
        } else if accepted.avg_readability < rejected.avg_readability {
            out.push(format!(
                "User prefers more sophisticated content (readability ~{:.0})",
                accepted.avg_readability
            ));
        }

        if accepted.avg_length > rejected.avg_length {
            out.push(format!(
                "User prefers longer content (~{:.0} words)",
                accepted.avg_length
            ));
        } else if accepted.avg_length < rejected.avg_length {
            out.push(format!(
                "User prefers more concise content (~{:.0} words)",
                accepted.avg_length
            ));
        }
    }

    out.extend(
        patterns
            .iter()
            .filter(|p| p.frequency >= RECOMMENDATION_MIN_PATTERN_FREQUENCY)
            .take(RECOMMENDATION_MAX_PATTERNS)
            .map(|p| format!("Common edit: {} ({}x)", p.description, p.frequency)),
    );

    out.extend(
        preferences
            .iter()
            .filter(|(_, pref)| pref.confidence >= STRONG_PREFERENCE_CONFIDENCE)
            .map(|(kind, pref)| {
                format!(
                    "Strong preference: {} = {} ({:.0}% confidence)",
                    kind,
                    pref.value,
                    pref.confidence * 100.0
                )
            }),
    );

    out
}

/// Guidance lines for the prompt-enhancement block.
///
/// Only preferences at or above [`GUIDANCE_MIN_CONFIDENCE`] and patterns at
/// or above [`GUIDANCE_MIN_PATTERN_FREQUENCY`] contribute. An empty result
/// means there is nothing worth telling the generator yet.
pub fn guidance_lines(preferences: &PreferenceMap, patterns: &[EditPattern]) -> Vec<String> {
    let confident = |kind: PreferenceKind| {
        preferences
            .get(&kind)
            .filter(|pref| pref.confidence >= GUIDANCE_MIN_CONFIDENCE)
    };
    let enabled = |kind: PreferenceKind| confident(kind).is_some_and(|pref| pref.is_true());

    let mut lines = Vec::new();

    if let Some(words) = confident(PreferenceKind::PreferredLength).and_then(|p| p.as_number()) {
        lines.push(format!("Target length: approximately {words:.0} words"));
    }

    if let Some(score) =
        confident(PreferenceKind::PreferredReadability).and_then(|p| p.as_number())
    {
        if score >= ACCESSIBLE_READABILITY {
            lines.push("Use clear, accessible language with short sentences".to_string());
        } else if score < SOPHISTICATED_READABILITY {
            lines.push(
                "Use sophisticated, complex language suited to an expert audience".to_string(),
            );
        }
    }

    if enabled(PreferenceKind::UsesBold) {
        lines.push("Use **bold** text to highlight key points".to_string());
    }
    if enabled(PreferenceKind::UsesBullets) {
        lines.push("Use bullet points to structure information".to_string());
    }
    if enabled(PreferenceKind::PrefersParagraphs) {
        lines.push("Break content into several short paragraphs".to_string());
    }

    if enabled(PreferenceKind::AvoidLongContent) {
        lines.push("Keep content concise; avoid verbose or lengthy output".to_string());
    }
    if enabled(PreferenceKind::AvoidShortContent) {
        lines.push("Provide sufficient detail; avoid overly brief output".to_string());
    }
    if enabled(PreferenceKind::AvoidTechnical) {
        lines.push("Avoid technical jargon and overly complex explanations".to_string());
    }
    if enabled(PreferenceKind::AvoidSimple) {
        lines.push("Provide depth; avoid overly simple or basic explanations".to_string());
    }

    lines.extend(
        patterns
            .iter()
            .filter(|p| p.frequency >= GUIDANCE_MIN_PATTERN_FREQUENCY)
            .take(GUIDANCE_MAX_PATTERNS)
            .map(|p| format!("Based on past edits: {}", p.description)),
    );

    lines
}
