//! Transient user-visible notices.
//!
//! A notice is cleared after a fixed delay unless a newer one replaced it;
//! generations stop a delayed clear from erasing a newer message.

/// Transient notice with generation tracking.
#[derive(Debug, Default)]
pub struct Notice {
    message: Option<String>,
    generation: u64,
}

impl Notice {
    /// Creates an empty notice slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a message and returns the generation a delayed clear must
    /// present to remove it.
    pub fn set(&mut self, message: impl Into<String>) -> u64 {
        self.generation += 1;
        self.message = Some(message.into());
        self.generation
    }

    /// Clears the message if `generation` still identifies it.
    ///
    /// Returns true if the notice was cleared.
    pub fn clear_if(&mut self, generation: u64) -> bool {
        if self.generation == generation && self.message.is_some() {
            self.message = None;
            true
        } else {
            false
        }
    }

    /// Current message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
