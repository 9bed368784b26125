//! Turn assembler for incremental transcription fragments.
//!
//! Merges role-tagged fragments into an ordered log of turns, handling:
//! - Interim text accumulating onto the open tail turn
//! - Role switches finalizing the previous speaker's open turn
//! - Annotation attachment by turn id after finalization

use crate::coach::feedback::Feedback;
use crate::transcript::turn::{ConversationTurn, Role, TranscriptFragment};
use tokio::sync::mpsc;

/// Event emitted when a turn reaches its final form.
#[derive(Debug, Clone)]
pub struct TurnEvent {
    /// Id of the finalized turn.
    pub id: u64,
    /// Speaker attribution.
    pub role: Role,
    /// Complete utterance text.
    pub text: String,
}

/// Assembler that merges transcription fragments into conversation turns.
///
/// Invariant: at most one non-final turn exists, and it is always the tail
/// of the log. A fragment for a different conversational role finalizes the
/// open tail before a new turn is pushed.
pub struct TurnAssembler {
    turns: Vec<ConversationTurn>,
    next_id: u64,
}

impl TurnAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            next_id: 0,
        }
    }

    /// Merges a fragment into the log.
    ///
    /// Returns the id of the turn the fragment landed in, or `None` if the
    /// fragment carried no text and was ignored.
    pub fn append_fragment(&mut self, fragment: TranscriptFragment) -> Option<u64> {
        // Malformed fragments are silently ignored
        if fragment.text.trim().is_empty() {
            return None;
        }

        // System messages never merge; they finalize the tail and stand alone
        if !fragment.role.is_conversational() {
            self.finalize_tail();
            return Some(self.push_turn(Role::System, fragment.text, true));
        }

        if let Some(last) = self.turns.last_mut() {
            if last.role == fragment.role && !last.is_final {
                last.text.push_str(&fragment.text);
                last.is_final = fragment.is_final;
                return Some(last.id);
            }
            // A fragment from the other speaker closes the open turn
            if !last.is_final {
                last.is_final = true;
            }
        }

        Some(self.push_turn(fragment.role, fragment.text, fragment.is_final))
    }

    fn push_turn(&mut self, role: Role, text: String, is_final: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.turns.push(ConversationTurn::new(id, role, text, is_final));
        id
    }

    /// Finalizes the tail turn if it is still open.
    ///
    /// Returns the id of the turn that was finalized, if any.
    pub fn finalize_tail(&mut self) -> Option<u64> {
        match self.turns.last_mut() {
            Some(last) if !last.is_final => {
                last.is_final = true;
                Some(last.id)
            }
            _ => None,
        }
    }

    /// Attaches feedback to a finalized turn by id.
    ///
    /// Unknown ids are ignored; turn text and finality are never touched.
    pub fn attach_feedback(&mut self, id: u64, feedback: Feedback) {
        if let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) {
            turn.feedback = Some(feedback);
        }
    }

    /// Removes a turn's feedback annotation, leaving the turn intact.
    pub fn clear_feedback(&mut self, id: u64) {
        if let Some(turn) = self.turns.iter_mut().find(|t| t.id == id) {
            turn.feedback = None;
        }
    }

    /// Returns a turn by id.
    pub fn get(&self, id: u64) -> Option<&ConversationTurn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// Returns the assembled turns in insertion order.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Returns the number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no turns have been assembled.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Clears the log.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.next_id = 0;
    }

    /// Runs the assembler as a station.
    ///
    /// Consumes fragments until the channel closes, emitting a [`TurnEvent`]
    /// each time a turn is finalized. The open tail turn is finalized and
    /// flushed when the input channel closes.
    ///
    /// # Arguments
    /// * `input` - Receiver for transcription fragments
    /// * `output` - Sender for finalized turns
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<TranscriptFragment>,
        output: mpsc::Sender<TurnEvent>,
    ) {
        while let Some(fragment) = input.recv().await {
            // Remember which turn was open; a role switch finalizes it
            let open_before = self.open_tail_id();
            let landed = self.append_fragment(fragment);

            if let Some(open_id) = open_before
                && landed.is_some()
                && landed != Some(open_id)
                && let Some(event) = self.event_for(open_id)
            {
                let _ = output.send(event).await;
            }

            if let Some(id) = landed
                && let Some(turn) = self.get(id)
                && turn.is_final
                && let Some(event) = self.event_for(id)
            {
                let _ = output.send(event).await;
            }
        }

        // Input closed mid-turn: flush what we have
        if let Some(id) = self.finalize_tail()
            && let Some(event) = self.event_for(id)
        {
            let _ = output.send(event).await;
        }
    }

    fn open_tail_id(&self) -> Option<u64> {
        self.turns.last().filter(|t| !t.is_final).map(|t| t.id)
    }

    fn event_for(&self, id: u64) -> Option<TurnEvent> {
        self.get(id).map(|t| TurnEvent {
            id: t.id,
            role: t.role,
            text: t.text.clone(),
        })
    }
}

impl Default for TurnAssembler {
    fn default() -> Self {
        Self::new()
    }
}
