use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of a recorded feedback event (monotonic, assigned by the store).
pub type FeedbackId = i64;

/// Human decision about one generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    /// Content was used as generated
    Accept,
    /// Content was used after manual changes
    Edit,
    /// Content was sent back for revision
    Reject,
}

impl UserAction {
    pub const ALL: [UserAction; 3] = [UserAction::Accept, UserAction::Edit, UserAction::Reject];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Edit => "edit",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserAction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "edit" => Ok(Self::Edit),
            "reject" => Ok(Self::Reject),
            "" => Err("user action must not be empty".to_string()),
            other => Err(format!(
                "unknown user action '{other}' (expected accept, edit or reject)"
            )),
        }
    }
}

/// Open key-value payload attached to an event, stored as a JSON document.
///
/// Recognized keys (version 1):
/// - `edited_content`: the human-edited text of an `edit` event
/// - `revision_reason`: the free-form reason given for a `reject` event
///
/// Any other key is kept in `extra` and round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedbackMetadata {
    pub fn edited(content: impl Into<String>) -> Self {
        Self {
            edited_content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn revision(reason: impl Into<String>) -> Self {
        Self {
            revision_reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edited_content.is_none() && self.revision_reason.is_none() && self.extra.is_empty()
    }
}

/// A feedback event as persisted in `feedback_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: FeedbackId,
    /// Creation timestamp in RFC3339 format (UTC, microseconds).
    pub timestamp: String,
    pub content_type: String,
    pub content_text: String,
    pub user_action: UserAction,
    #[serde(default)]
    pub original_prompt: Option<String>,
    /// Seconds spent generating the content
    #[serde(default)]
    pub generation_time: Option<f64>,
    /// xxHash64 of the content text, hex encoded
    pub content_hash: String,
    #[serde(default)]
    pub metadata: FeedbackMetadata,
}

/// Input for recording a new feedback event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub content_type: String,
    pub content_text: String,
    pub user_action: UserAction,
    pub original_prompt: Option<String>,
    pub generation_time: Option<f64>,
    pub metadata: FeedbackMetadata,
}

impl NewFeedback {
    pub fn new(
        content_type: impl Into<String>,
        content_text: impl Into<String>,
        user_action: UserAction,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            content_text: content_text.into(),
            user_action,
            original_prompt: None,
            generation_time: None,
            metadata: FeedbackMetadata::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.original_prompt = Some(prompt.into());
        self
    }

    pub fn with_generation_time(mut self, seconds: f64) -> Self {
        self.generation_time = Some(seconds);
        self
    }

    pub fn with_metadata(mut self, metadata: FeedbackMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Edited text carried by an `edit` event, if any.
    pub fn edited_content(&self) -> Option<&str> {
        match self.user_action {
            UserAction::Edit => self.metadata.edited_content.as_deref(),
            _ => None,
        }
    }
}
