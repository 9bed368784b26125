//! Playback position tracking for synthesized speech.
//!
//! The tracker is pure state bookkeeping against a monotonic audio clock;
//! device effects (starting and stopping segments) are carried out by the
//! session using the actions the tracker returns.

pub mod clock;
pub mod tracker;

pub use clock::{AudioClock, SystemClock};
pub use tracker::{PlaybackTracker, ToggleAction};
