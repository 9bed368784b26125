//! Coaching backend: conversational replies, pronunciation feedback, and
//! speech synthesis from a remote generative-AI service.

pub mod backend;
pub mod debounce;
pub mod feedback;
pub mod remote;

pub use backend::CoachBackend;
pub use debounce::Debouncer;
pub use feedback::{Feedback, PronunciationIssue};
pub use remote::RemoteBackend;
