//! parlo - Conversational English pronunciation coaching for the terminal
//!
//! Assembles chat-like transcripts from incremental transcription
//! fragments, asks a remote backend for replies and pronunciation
//! feedback, and plays synthesized speech with pause/resume bookkeeping.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod app;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod coach;
pub mod config;
pub mod defaults;
pub mod error;
pub mod playback;
pub mod session;
pub mod transcript;

// Core traits (source → session → output)
pub use audio::player::AudioOutput;
pub use coach::backend::CoachBackend;
pub use playback::clock::AudioClock;
pub use session::sink::{CollectorSink, SessionSink, StdoutSink};

// Session loop
pub use session::{Session, SessionEvent, SessionOptions};

// Transcript assembly
pub use transcript::{ConversationTurn, Role, TranscriptFragment, TurnAssembler};

// Playback bookkeeping
pub use playback::{PlaybackTracker, ToggleAction};

// Error handling
pub use error::{ParloError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.0.1+abc1234"` when git hash is available, `"0.0.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
