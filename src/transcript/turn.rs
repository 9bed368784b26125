//! Turn and fragment types for the transcript.
//!
//! Defines the data structures that flow between the recognition source,
//! the assembler, and the session.

use crate::coach::feedback::Feedback;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Speaker attribution for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human learner.
    User,
    /// The coaching agent.
    Agent,
    /// Informational messages (always final).
    System,
}

impl Role {
    /// Returns true for the two conversational roles that can carry
    /// interim (non-final) text.
    pub fn is_conversational(&self) -> bool {
        matches!(self, Role::User | Role::Agent)
    }
}

/// An incremental transcription fragment from the recognition collaborator.
#[derive(Debug, Clone)]
pub struct TranscriptFragment {
    /// Speaker the fragment is attributed to.
    pub role: Role,
    /// Text to merge into the transcript.
    pub text: String,
    /// Whether the recognizer considers the current turn complete.
    pub is_final: bool,
}

impl TranscriptFragment {
    /// Creates a new fragment.
    pub fn new(role: Role, text: impl Into<String>, is_final: bool) -> Self {
        Self {
            role,
            text: text.into(),
            is_final,
        }
    }
}

/// One contiguous utterance attributed to a single speaker role.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    /// Identifier for annotation lookup. Unique within a session.
    pub id: u64,
    /// Speaker attribution.
    pub role: Role,
    /// Utterance text. Append-only until finalized.
    pub text: String,
    /// Monotonic: once true, never reverts.
    pub is_final: bool,
    /// When the turn was opened.
    pub timestamp: Instant,
    /// Optional pronunciation/grammar feedback attached after finalization.
    pub feedback: Option<Feedback>,
}

impl ConversationTurn {
    /// Creates a new turn carrying its first fragment.
    pub fn new(id: u64, role: Role, text: String, is_final: bool) -> Self {
        Self {
            id,
            role,
            text,
            is_final,
            timestamp: Instant::now(),
            feedback: None,
        }
    }
}
