//! Pause/resume bookkeeping for a single decoded audio buffer.
//!
//! Tracks the playback position of one buffer against a monotonic audio
//! clock, reconciling "intentional pause" against "segment ended naturally".
//! The tracker holds no samples and touches no device; [`toggle`] returns
//! the action the owner should apply to the audio output.
//!
//! [`toggle`]: PlaybackTracker::toggle

use crate::defaults::END_TOLERANCE_SECS;
use crate::playback::clock::AudioClock;

/// Device action requested by a toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToggleAction {
    /// Start a new segment at the given offset in seconds.
    Play { offset: f64 },
    /// Stop the current segment, keeping the accumulated offset.
    Pause,
}

/// Playback position tracker for a single buffer.
pub struct PlaybackTracker {
    clock: Box<dyn AudioClock>,
    /// Duration of the loaded buffer in seconds. None when nothing is loaded.
    duration: Option<f64>,
    /// Accumulated offset where playback last stopped.
    paused_at: f64,
    /// Clock reading when the current segment began.
    clock_start: f64,
    playing: bool,
    /// Set by toggle-pause, consumed by segment_ended to tell a manual stop
    /// apart from the buffer running out.
    intentional_pause: bool,
}

impl PlaybackTracker {
    /// Creates a tracker with no buffer loaded.
    pub fn new(clock: Box<dyn AudioClock>) -> Self {
        Self {
            clock,
            duration: None,
            paused_at: 0.0,
            clock_start: 0.0,
            playing: false,
            intentional_pause: false,
        }
    }

    /// Installs a freshly decoded buffer, resetting to stopped-at-zero.
    ///
    /// Non-finite or negative durations are treated as an empty buffer.
    pub fn load(&mut self, duration: f64) {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        };
        self.duration = Some(duration);
        self.paused_at = 0.0;
        self.clock_start = 0.0;
        self.playing = false;
        self.intentional_pause = false;
    }

    /// Drops the loaded buffer state entirely.
    pub fn clear(&mut self) {
        self.duration = None;
        self.paused_at = 0.0;
        self.clock_start = 0.0;
        self.playing = false;
        self.intentional_pause = false;
    }

    /// Toggles between playing and paused.
    ///
    /// Returns the device action to apply, or `None` when no buffer is
    /// loaded. Resuming at or past the buffer's end wraps to offset 0.
    pub fn toggle(&mut self) -> Option<ToggleAction> {
        let duration = self.duration?;

        if self.playing {
            self.intentional_pause = true;
            let elapsed = self.clock.now() - self.clock_start;
            self.paused_at = (self.paused_at + elapsed).clamp(0.0, duration);
            self.playing = false;
            Some(ToggleAction::Pause)
        } else {
            if self.paused_at >= duration {
                self.paused_at = 0.0;
            }
            self.clock_start = self.clock.now();
            self.playing = true;
            self.intentional_pause = false;
            Some(ToggleAction::Play {
                offset: self.paused_at,
            })
        }
    }

    /// Records that the current segment stopped on the device side.
    ///
    /// A stop without an intentional pause is a natural end: the position
    /// resets so the next toggle restarts from the beginning. A pause whose
    /// accumulated offset lies within [`END_TOLERANCE_SECS`] of the buffer's
    /// end is treated the same way; the race between the pause and the
    /// buffer running out cannot be resolved exactly on a floating-point
    /// clock.
    pub fn segment_ended(&mut self) {
        let Some(duration) = self.duration else {
            return;
        };

        let ended_naturally =
            !self.intentional_pause || self.paused_at >= duration - END_TOLERANCE_SECS;

        if ended_naturally {
            self.paused_at = 0.0;
        }
        self.playing = false;
        self.intentional_pause = false;
    }

    /// Returns true while a segment is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Returns true when a buffer is loaded.
    pub fn has_buffer(&self) -> bool {
        self.duration.is_some()
    }

    /// Offset where playback last stopped, in seconds.
    pub fn paused_at(&self) -> f64 {
        self.paused_at
    }

    /// Current position in seconds: the accumulated offset plus, while
    /// playing, the elapsed time of the running segment.
    pub fn position(&self) -> f64 {
        let Some(duration) = self.duration else {
            return 0.0;
        };
        if self.playing {
            (self.paused_at + self.clock.now() - self.clock_start).clamp(0.0, duration)
        } else {
            self.paused_at
        }
    }
}
