//! Conversation transcript assembly.
//!
//! Incremental transcription fragments arrive role-tagged with a
//! final/interim flag; the assembler merges them into an ordered log of
//! conversation turns.

pub mod assembler;
pub mod turn;

pub use assembler::{TurnAssembler, TurnEvent};
pub use turn::{ConversationTurn, Role, TranscriptFragment};
