//! Preference learning rules.
//!
//! Each rule is a predicate over one feedback event that may yield a
//! [`PreferenceSignal`]. Accepted content reveals what the user likes,
//! rejection reasons reveal what to avoid. Edits are captured as edit
//! patterns instead and produce no preference signal.

use super::metrics::{bold_marker_count, bullet_line_count, paragraph_break_count};
use crate::domain::{FeedbackMetadata, PreferenceKind, PreferenceSignal, TextMetrics, UserAction};

/// Everything a rule may look at for one event.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub action: UserAction,
    pub text: &'a str,
    pub metrics: &'a TextMetrics,
    pub metadata: &'a FeedbackMetadata,
}

#[derive(Debug, Clone, Copy)]
pub enum RuleCondition {
    /// Derives a value from accepted content.
    Accepted(fn(&SignalContext<'_>) -> Option<String>),
    /// Matches when the rejection reason contains any of the keywords.
    RejectedFor(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct PreferenceRule {
    pub kind: PreferenceKind,
    pub condition: RuleCondition,
}

impl PreferenceRule {
    pub fn evaluate(&self, ctx: &SignalContext<'_>) -> Option<PreferenceSignal> {
        match self.condition {
            RuleCondition::Accepted(derive) if ctx.action == UserAction::Accept => {
                derive(ctx).map(|value| PreferenceSignal::new(self.kind, value))
            }
            RuleCondition::RejectedFor(keywords) if ctx.action == UserAction::Reject => {
                let reason = ctx.metadata.revision_reason.as_deref()?.to_lowercase();
                keywords
                    .iter()
                    .any(|keyword| reason.contains(keyword))
                    .then(|| PreferenceSignal::flag(self.kind))
            }
            _ => None,
        }
    }
}

pub const DEFAULT_RULES: &[PreferenceRule] = &[
    PreferenceRule {
        kind: PreferenceKind::PreferredLength,
        condition: RuleCondition::Accepted(|ctx| Some(ctx.metrics.word_count.to_string())),
    },
    PreferenceRule {
        kind: PreferenceKind::PreferredReadability,
        condition: RuleCondition::Accepted(|ctx| Some(format!("{:.1}", ctx.metrics.readability))),
    },
    PreferenceRule {
        kind: PreferenceKind::UsesBold,
        condition: RuleCondition::Accepted(|ctx| flag(bold_marker_count(ctx.text) > 0)),
    },
    PreferenceRule {
        kind: PreferenceKind::UsesBullets,
        condition: RuleCondition::Accepted(|ctx| flag(bullet_line_count(ctx.text) > 0)),
    },
    PreferenceRule {
        kind: PreferenceKind::PrefersParagraphs,
        condition: RuleCondition::Accepted(|ctx| flag(paragraph_break_count(ctx.text) > 2)),
    },
    PreferenceRule {
        kind: PreferenceKind::AvoidLongContent,
        condition: RuleCondition::RejectedFor(&["too long", "verbose", "lengthy"]),
    },
    PreferenceRule {
        kind: PreferenceKind::AvoidShortContent,
        condition: RuleCondition::RejectedFor(&["too short", "brief", "more detail"]),
    },
    PreferenceRule {
        kind: PreferenceKind::AvoidTechnical,
        condition: RuleCondition::RejectedFor(&["technical", "complex", "difficult"]),
    },
    PreferenceRule {
        kind: PreferenceKind::AvoidSimple,
        condition: RuleCondition::RejectedFor(&["simple", "basic", "more depth"]),
    },
];

fn flag(present: bool) -> Option<String> {
    present.then(|| "true".to_string())
}

/// Ordered rule table applied to every submitted event.
#[derive(Debug, Clone)]
pub struct PreferenceLearner {
    rules: Vec<PreferenceRule>,
}

impl Default for PreferenceLearner {
    fn default() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }
}

impl PreferenceLearner {
    pub fn with_rules(rules: Vec<PreferenceRule>) -> Self {
        Self { rules }
    }

    /// Signals in rule order; at most one per rule.
    pub fn signals(&self, ctx: &SignalContext<'_>) -> Vec<PreferenceSignal> {
        self.rules.iter().filter_map(|rule| rule.evaluate(ctx)).collect()
    }
}
