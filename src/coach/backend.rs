//! Backend trait for the coaching service.

use crate::coach::feedback::Feedback;
use crate::error::Result;
use crate::transcript::turn::ConversationTurn;

/// Remote collaborator providing replies, feedback, and synthesized speech.
///
/// The wire protocol is the implementation's business; the session only
/// sees these three operations. Implementations must be shareable across
/// spawned worker tasks.
#[async_trait::async_trait]
pub trait CoachBackend: Send + Sync + 'static {
    /// Next coach utterance given the finalized transcript so far.
    async fn reply(&self, history: &[ConversationTurn]) -> Result<String>;

    /// Schema-constrained pronunciation/grammar feedback for one user
    /// utterance.
    async fn feedback(&self, utterance: &str) -> Result<Feedback>;

    /// Synthesized speech for the given text, as mono 16-bit samples at
    /// [`crate::defaults::TTS_SAMPLE_RATE`].
    async fn synthesize(&self, text: &str) -> Result<Vec<i16>>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_trait_object_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<Box<dyn CoachBackend>>();
    }
}
