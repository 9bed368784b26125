//! Coaching session event loop.
//!
//! One task owns all session state: the transcript, the playback tracker,
//! the cached synthesized speech, and the transient notice. Everything else
//! (backend calls, the audio device, the recognition source) communicates
//! with it through [`SessionEvent`]s. Handlers never block; long-running
//! work is spawned and reports back over the same channel.

pub mod notice;
pub mod sink;

use crate::audio::player::AudioOutput;
use crate::audio::wav::buffer_duration;
use crate::coach::backend::CoachBackend;
use crate::coach::debounce::Debouncer;
use crate::coach::feedback::Feedback;
use crate::config::Config;
use crate::error::{ParloError, Result};
use crate::playback::clock::SystemClock;
use crate::playback::tracker::{PlaybackTracker, ToggleAction};
use crate::transcript::assembler::TurnAssembler;
use crate::transcript::turn::{Role, TranscriptFragment};
use notice::Notice;
use sink::SessionSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Events driving the session loop.
#[derive(Debug)]
pub enum SessionEvent {
    /// Incremental transcription text from the recognition source.
    Fragment(TranscriptFragment),
    /// The user asked to pause or resume coach speech.
    TogglePlayback,
    /// The audio device reports the current segment stopped.
    PlaybackEnded,
    /// A reply worker finished.
    ReplyReady { result: Result<String> },
    /// A feedback worker finished.
    FeedbackReady { turn_id: u64, result: Result<Feedback> },
    /// A synthesis worker finished.
    SpeechReady {
        generation: u64,
        text: String,
        result: Result<Vec<i16>>,
    },
    /// A delayed notice clear fired.
    ClearNotice { generation: u64 },
    /// Stop playback and end the session.
    Shutdown,
}

/// Tunables lifted from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Request per-utterance feedback.
    pub feedback: bool,
    /// Quiet period before background synthesis fires.
    pub debounce: Duration,
    /// Delay before a transient notice is cleared.
    pub notice_clear: Duration,
    /// Sample rate of synthesized speech.
    pub tts_sample_rate: u32,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            feedback: config.coach.feedback,
            debounce: Duration::from_millis(config.coach.debounce_ms),
            notice_clear: Duration::from_secs(config.coach.notice_clear_secs),
            tts_sample_rate: config.audio.tts_sample_rate,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The single cached synthesized buffer, keyed by its source text.
struct SpeechCache {
    text: String,
    samples: Arc<Vec<i16>>,
}

/// Coaching session: owns all mutable state, driven by [`SessionEvent`]s.
pub struct Session {
    assembler: TurnAssembler,
    tracker: PlaybackTracker,
    output: Box<dyn AudioOutput>,
    backend: Arc<dyn CoachBackend>,
    sink: Box<dyn SessionSink>,
    debouncer: Debouncer,
    options: SessionOptions,
    events: mpsc::Sender<SessionEvent>,
    speech: Option<SpeechCache>,
    notice: Notice,
    awaiting_reply: bool,
}

impl Session {
    /// Creates a session.
    ///
    /// `events` must be the sender half of the channel whose receiver is
    /// later passed to [`run`](Session::run); workers spawned by the
    /// session report back through it.
    pub fn new(
        backend: Arc<dyn CoachBackend>,
        output: Box<dyn AudioOutput>,
        sink: Box<dyn SessionSink>,
        options: SessionOptions,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            assembler: TurnAssembler::new(),
            tracker: PlaybackTracker::new(Box::new(SystemClock::new())),
            output,
            backend,
            sink,
            debouncer: Debouncer::new(options.debounce),
            options,
            events,
            speech: None,
            notice: Notice::new(),
            awaiting_reply: false,
        }
    }

    /// Runs the session until the channel closes or a Shutdown arrives.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        self.output.stop();
    }

    /// Dispatches one event. Returns false when the session should end.
    fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Fragment(fragment) => self.on_fragment(fragment),
            SessionEvent::TogglePlayback => self.on_toggle(),
            SessionEvent::PlaybackEnded => {
                self.tracker.segment_ended();
                self.sink.playback(false);
            }
            SessionEvent::ReplyReady { result } => self.on_reply(result),
            SessionEvent::FeedbackReady { turn_id, result } => self.on_feedback(turn_id, result),
            SessionEvent::SpeechReady {
                generation,
                text,
                result,
            } => self.on_speech(generation, text, result),
            SessionEvent::ClearNotice { generation } => {
                if self.notice.clear_if(generation) {
                    self.sink.notice(None);
                }
            }
            SessionEvent::Shutdown => return false,
        }
        true
    }

    fn on_fragment(&mut self, fragment: TranscriptFragment) {
        let open_before = self
            .assembler
            .turns()
            .last()
            .filter(|t| !t.is_final)
            .map(|t| t.id);

        let Some(landed) = self.assembler.append_fragment(fragment) else {
            return;
        };

        // A role switch finalized the previously open turn
        if let Some(open_id) = open_before
            && open_id != landed
            && let Some(turn) = self.assembler.get(open_id)
        {
            let turn = turn.clone();
            self.sink.turn(&turn);
            if turn.role == Role::User {
                self.on_user_turn(turn.id, turn.text);
            }
        }

        let Some(turn) = self.assembler.get(landed) else {
            return;
        };
        if turn.is_final {
            let turn = turn.clone();
            self.sink.turn(&turn);
            if turn.role == Role::User {
                self.on_user_turn(turn.id, turn.text);
            }
        }
    }

    /// A user turn settled: request feedback and the next coach reply.
    fn on_user_turn(&mut self, turn_id: u64, text: String) {
        if self.options.feedback {
            let backend = Arc::clone(&self.backend);
            let events = self.events.clone();
            let utterance = text.clone();
            tokio::spawn(async move {
                let result = backend.feedback(&utterance).await;
                let _ = events
                    .send(SessionEvent::FeedbackReady { turn_id, result })
                    .await;
            });
        }

        // One reply in flight at a time; a second user turn lands in the
        // history the next request snapshots
        if !self.awaiting_reply {
            self.awaiting_reply = true;
            let backend = Arc::clone(&self.backend);
            let events = self.events.clone();
            let history = self.assembler.turns().to_vec();
            tokio::spawn(async move {
                let result = backend.reply(&history).await;
                let _ = events.send(SessionEvent::ReplyReady { result }).await;
            });
        }
    }

    fn on_reply(&mut self, result: Result<String>) {
        self.awaiting_reply = false;
        match result {
            Ok(text) => {
                if let Some(id) = self
                    .assembler
                    .append_fragment(TranscriptFragment::new(Role::Agent, text.clone(), true))
                    && let Some(turn) = self.assembler.get(id)
                {
                    let turn = turn.clone();
                    self.sink.turn(&turn);
                }
                self.schedule_speech(text);
            }
            Err(e) => self.report_error("reply", e),
        }
    }

    fn on_feedback(&mut self, turn_id: u64, result: Result<Feedback>) {
        match result {
            Ok(feedback) => {
                self.assembler.attach_feedback(turn_id, feedback);
                if let Some(turn) = self.assembler.get(turn_id) {
                    let turn = turn.clone();
                    self.sink.feedback(&turn);
                }
            }
            Err(e) => {
                // The base transcript stays; only the annotation is dropped
                self.assembler.clear_feedback(turn_id);
                self.report_error("feedback", e);
            }
        }
    }

    /// Debounce-synthesize speech for the given text.
    ///
    /// The cached buffer is keyed by the exact text: a match keeps the
    /// buffer and its playback position, anything else discards both.
    fn schedule_speech(&mut self, text: String) {
        if self
            .speech
            .as_ref()
            .is_some_and(|cache| cache.text == text)
        {
            return;
        }

        // Source text changed: the old buffer is gone
        if self.tracker.is_playing() {
            self.output.stop();
            self.sink.playback(false);
        }
        self.speech = None;
        self.tracker.clear();

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.debouncer.schedule(move |generation| async move {
            let result = backend.synthesize(&text).await;
            let _ = events
                .send(SessionEvent::SpeechReady {
                    generation,
                    text,
                    result,
                })
                .await;
        });
    }

    fn on_speech(&mut self, generation: u64, text: String, result: Result<Vec<i16>>) {
        // A newer trigger superseded this call while it was in flight
        if !self.debouncer.is_current(generation) {
            return;
        }

        match result {
            Ok(samples) => {
                let duration = buffer_duration(samples.len(), self.options.tts_sample_rate);
                if self.tracker.is_playing() {
                    self.output.stop();
                    self.sink.playback(false);
                }
                self.speech = Some(SpeechCache {
                    text,
                    samples: Arc::new(samples),
                });
                self.tracker.load(duration);
            }
            Err(e) => self.report_error("synthesis", e),
        }
    }

    fn on_toggle(&mut self) {
        match self.tracker.toggle() {
            Some(ToggleAction::Play { offset }) => {
                let Some(cache) = &self.speech else {
                    return;
                };
                let samples = Arc::clone(&cache.samples);
                match self
                    .output
                    .play(samples, self.options.tts_sample_rate, offset)
                {
                    Ok(()) => self.sink.playback(true),
                    Err(e) => {
                        self.tracker.segment_ended();
                        self.report_error("playback", e);
                    }
                }
            }
            Some(ToggleAction::Pause) => {
                self.output.stop();
                // stop() is silent; reconcile the pause the same way a
                // device end event would
                self.tracker.segment_ended();
                self.sink.playback(false);
            }
            None => {}
        }
    }

    /// Surfaces a failure: rate limits get a transient auto-cleared notice,
    /// everything else is logged and surfaced generically. No retries.
    fn report_error(&mut self, context: &str, error: ParloError) {
        if error.is_rate_limited() {
            let generation = self
                .notice
                .set("Rate limit reached — give it a few seconds and try again");
            self.sink.notice(self.notice.message());

            let events = self.events.clone();
            let delay = self.options.notice_clear;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = events.send(SessionEvent::ClearNotice { generation }).await;
            });
        } else {
            eprintln!("parlo: {} failed: {}", context, error);
            self.notice.set("Something went wrong — please try again");
            self.sink.notice(self.notice.message());
        }
    }

}
