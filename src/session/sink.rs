//! Pluggable session output handlers.
//!
//! The session reports transcript and state changes through this seam so
//! the interactive CLI, tests, and any future frontend render them their
//! own way.

use crate::transcript::turn::ConversationTurn;

/// Receiver for user-visible session updates.
pub trait SessionSink: Send + 'static {
    /// A turn reached its final form.
    fn turn(&mut self, turn: &ConversationTurn);

    /// Feedback was attached to (or cleared from) a turn.
    fn feedback(&mut self, turn: &ConversationTurn);

    /// The transient notice changed. None means cleared.
    fn notice(&mut self, message: Option<&str>);

    /// Playback started or stopped.
    fn playback(&mut self, playing: bool) {
        let _ = playing;
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Sink that prints plain text to stdout.
pub struct StdoutSink;

impl SessionSink for StdoutSink {
    fn turn(&mut self, turn: &ConversationTurn) {
        println!("{:?}: {}", turn.role, turn.text);
    }

    fn feedback(&mut self, turn: &ConversationTurn) {
        if let Some(feedback) = &turn.feedback {
            println!("  feedback: {}", feedback.comment);
            for issue in &feedback.issues {
                match &issue.hint {
                    Some(hint) => println!("    {} — {}", issue.word, hint),
                    None => println!("    {}", issue.word),
                }
            }
        }
    }

    fn notice(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            println!("[{}]", message);
        }
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Sink that collects updates for assertions in tests.
#[derive(Default)]
pub struct CollectorSink {
    pub turns: Vec<(u64, String)>,
    pub feedback_events: Vec<u64>,
    pub notices: Vec<Option<String>>,
    pub playback_changes: Vec<bool>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionSink for CollectorSink {
    fn turn(&mut self, turn: &ConversationTurn) {
        self.turns.push((turn.id, turn.text.clone()));
    }

    fn feedback(&mut self, turn: &ConversationTurn) {
        self.feedback_events.push(turn.id);
    }

    fn notice(&mut self, message: Option<&str>) {
        self.notices.push(message.map(str::to_string));
    }

    fn playback(&mut self, playing: bool) {
        self.playback_changes.push(playing);
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::turn::Role;

    #[test]
    fn collector_records_turns() {
        let mut sink = CollectorSink::new();
        let turn = ConversationTurn::new(3, Role::Agent, "Hi".to_string(), true);

        sink.turn(&turn);

        assert_eq!(sink.turns, vec![(3, "Hi".to_string())]);
    }

    #[test]
    fn collector_records_notices() {
        let mut sink = CollectorSink::new();
        sink.notice(Some("busy"));
        sink.notice(None);

        assert_eq!(sink.notices, vec![Some("busy".to_string()), None]);
    }

    #[test]
    fn sink_trait_object_is_send() {
        fn assert_send<T: Send + ?Sized>() {}
        assert_send::<Box<dyn SessionSink>>();
    }
}
