//! Feedback types and prompt construction for the coaching backend.

use crate::transcript::turn::{ConversationTurn, Role};
use serde::{Deserialize, Serialize};

/// One flagged word or phrase in a user utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PronunciationIssue {
    /// The word or phrase as the learner said it.
    pub word: String,
    /// How to say or phrase it instead.
    #[serde(default)]
    pub hint: Option<String>,
}

/// Pronunciation/grammar feedback for one user utterance.
///
/// Deserialized from the backend's schema-constrained JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Overall comment on the utterance.
    pub comment: String,
    /// Specific words or phrases to work on.
    #[serde(default)]
    pub issues: Vec<PronunciationIssue>,
    /// Optional 0-100 score.
    #[serde(default)]
    pub score: Option<u8>,
}

impl Feedback {
    /// Feedback carrying only an overall comment.
    pub fn comment_only(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            issues: Vec::new(),
            score: None,
        }
    }
}

/// System instruction for the conversational reply call.
pub const REPLY_INSTRUCTION: &str = "You are a friendly English conversation coach. \
Keep the conversation going with one short, natural reply. \
Ask a follow-up question when it helps the learner keep talking.";

/// System instruction for the feedback call.
pub const FEEDBACK_INSTRUCTION: &str = "You are an English pronunciation and grammar coach. \
Review the learner's utterance and point out the few things most worth fixing. \
Be encouraging and concrete.";

/// JSON schema constraining the feedback response shape.
///
/// Sent with the feedback request so the backend returns exactly the
/// [`Feedback`] structure.
pub fn feedback_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "comment": { "type": "string" },
            "issues": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "word": { "type": "string" },
                        "hint": { "type": "string" }
                    },
                    "required": ["word"]
                }
            },
            "score": { "type": "integer", "minimum": 0, "maximum": 100 }
        },
        "required": ["comment"]
    })
}

/// Renders the finalized transcript as a prompt for the reply call.
///
/// Interim turns are skipped; the backend only ever sees settled text.
pub fn build_reply_prompt(turns: &[ConversationTurn]) -> String {
    let mut prompt = String::new();
    for turn in turns.iter().filter(|t| t.is_final) {
        let speaker = match turn.role {
            Role::User => "Learner",
            Role::Agent => "Coach",
            Role::System => continue,
        };
        prompt.push_str(speaker);
        prompt.push_str(": ");
        prompt.push_str(&turn.text);
        prompt.push('\n');
    }
    prompt.push_str("Coach:");
    prompt
}

/// Renders a single user utterance as a prompt for the feedback call.
pub fn build_feedback_prompt(utterance: &str) -> String {
    format!("The learner said: \"{}\"", utterance.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_deserializes_full_shape() {
        let json = r#"{
            "comment": "Nice fluency!",
            "issues": [
                { "word": "goed", "hint": "Use 'went'." },
                { "word": "th" }
            ],
            "score": 82
        }"#;

        let feedback: Feedback = serde_json::from_str(json).unwrap();
        assert_eq!(feedback.comment, "Nice fluency!");
        assert_eq!(feedback.issues.len(), 2);
        assert_eq!(feedback.issues[0].hint.as_deref(), Some("Use 'went'."));
        assert_eq!(feedback.issues[1].hint, None);
        assert_eq!(feedback.score, Some(82));
    }

    #[test]
    fn feedback_deserializes_minimal_shape() {
        let json = r#"{ "comment": "Good job" }"#;
        let feedback: Feedback = serde_json::from_str(json).unwrap();

        assert_eq!(feedback.comment, "Good job");
        assert!(feedback.issues.is_empty());
        assert_eq!(feedback.score, None);
    }

    #[test]
    fn feedback_schema_requires_comment() {
        let schema = feedback_schema();
        assert_eq!(schema["required"][0], "comment");
        assert_eq!(schema["properties"]["score"]["maximum"], 100);
    }

    #[test]
    fn reply_prompt_includes_only_final_turns() {
        let turns = vec![
            ConversationTurn::new(0, Role::User, "Hello".to_string(), true),
            ConversationTurn::new(1, Role::Agent, "Hi! How are you?".to_string(), true),
            ConversationTurn::new(2, Role::User, "I am fi".to_string(), false),
        ];

        let prompt = build_reply_prompt(&turns);

        assert!(prompt.contains("Learner: Hello"));
        assert!(prompt.contains("Coach: Hi! How are you?"));
        assert!(!prompt.contains("I am fi"));
        assert!(prompt.ends_with("Coach:"));
    }

    #[test]
    fn reply_prompt_skips_system_turns() {
        let turns = vec![
            ConversationTurn::new(0, Role::System, "Session started".to_string(), true),
            ConversationTurn::new(1, Role::User, "Hey".to_string(), true),
        ];

        let prompt = build_reply_prompt(&turns);
        assert!(!prompt.contains("Session started"));
        assert!(prompt.contains("Learner: Hey"));
    }

    #[test]
    fn feedback_prompt_trims_utterance() {
        let prompt = build_feedback_prompt("  I goed there  ");
        assert_eq!(prompt, "The learner said: \"I goed there\"");
    }
}
