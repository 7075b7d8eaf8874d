//! Conversation store: the ordered turn sequence for the active session

use crate::reducer::apply_update;
use crate::turn::{ErrorKind, Turn};
use colloquy_api::StreamingUpdate;
use uuid::Uuid;

/// Terminal transition applied when a turn finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The stream finished; keep the accumulated answer
    Answered,
    /// Transport failure, classified into a kind
    Failed(ErrorKind),
    /// The caller aborted; keep whatever partial answer accumulated
    Cancelled,
}

/// Holds the ordered turns of one conversation.
///
/// All mutation goes through these operations; readers only ever see the
/// sequence through the accessor methods. The store is instance-scoped:
/// create one per session, share nothing.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh pending turn for `question`, returning its id
    pub fn add_turn(&mut self, question: impl Into<String>) -> Uuid {
        let turn = Turn::new(question);
        let id = turn.id;
        self.turns.push(turn);
        id
    }

    /// Apply a streaming update to the turn with `id`.
    ///
    /// Unknown ids and terminal turns are silently skipped: chunks that
    /// arrive after cancellation or a session switch are expected and
    /// must not fail.
    pub fn update_turn(&mut self, id: Uuid, update: StreamingUpdate) {
        match self.turns.iter_mut().find(|t| t.id == id) {
            Some(turn) if turn.is_pending => apply_update(turn, update),
            _ => {}
        }
    }

    /// Move the turn with `id` into a terminal state.
    ///
    /// No-op on unknown ids and already-terminal turns, for the same
    /// reason as [`update_turn`](Self::update_turn).
    pub fn complete_turn(&mut self, id: Uuid, completion: Completion) {
        let Some(turn) = self.turns.iter_mut().find(|t| t.id == id && t.is_pending) else {
            return;
        };

        match completion {
            Completion::Answered | Completion::Cancelled => {}
            Completion::Failed(kind) => turn.error = Some(kind),
        }
        turn.is_pending = false;
    }

    /// Clear all turns; used when switching sessions
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Replace the whole sequence, as when a prior session is loaded
    pub fn replace_turns(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
    }

    /// The current turn sequence, in chronological order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Look up a turn by id
    pub fn turn(&self, id: Uuid) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// The most recent turn
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Whether the most recent turn is still awaiting its answer
    pub fn is_response_pending(&self) -> bool {
        self.turns.last().is_some_and(|t| t.is_pending)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::{Answer, TurnStatus};

    #[test]
    fn test_reset_then_add_turn() {
        let mut store = ConversationStore::new();
        store.add_turn("old");
        store.reset();

        let id = store.add_turn("hi");
        assert_eq!(store.len(), 1);

        let turn = store.turn(id).unwrap();
        assert_eq!(turn.question, "hi");
        assert!(turn.answer.is_none());
        assert!(turn.error.is_none());
        assert!(turn.is_pending);
    }

    #[test]
    fn test_turns_keep_insertion_order() {
        let mut store = ConversationStore::new();
        let first = store.add_turn("first");
        let second = store.add_turn("second");

        let ids: Vec<_> = store.turns().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(store.is_response_pending());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = ConversationStore::new();
        store.add_turn("q");
        store.update_turn(Uuid::new_v4(), StreamingUpdate::fragment("late"));
        assert!(store.turns()[0].answer.is_none());
    }

    #[test]
    fn test_update_terminal_turn_is_noop() {
        let mut store = ConversationStore::new();
        let id = store.add_turn("q");
        store.update_turn(id, StreamingUpdate::fragment("before"));
        store.complete_turn(id, Completion::Cancelled);

        store.update_turn(id, StreamingUpdate::fragment(" after"));
        assert_eq!(store.turn(id).unwrap().answer_text(), Some("before"));
    }

    #[test]
    fn test_cancel_keeps_partial_answer() {
        let mut store = ConversationStore::new();
        let id = store.add_turn("q");
        store.update_turn(id, StreamingUpdate::fragment("Hel"));
        store.update_turn(id, StreamingUpdate::fragment("lo"));
        store.complete_turn(id, Completion::Cancelled);

        let turn = store.turn(id).unwrap();
        assert!(!turn.is_pending);
        assert!(turn.error.is_none());
        assert_eq!(turn.answer_text(), Some("Hello"));
    }

    #[test]
    fn test_failed_completion_keeps_partial_answer() {
        let mut store = ConversationStore::new();
        let id = store.add_turn("q");
        store.update_turn(id, StreamingUpdate::fragment("part"));
        store.complete_turn(id, Completion::Failed(ErrorKind::Timeout));

        let turn = store.turn(id).unwrap();
        assert_eq!(turn.error, Some(ErrorKind::Timeout));
        assert!(!turn.is_pending);
        assert_eq!(turn.answer, Some(Answer::Text("part".into())));
        assert_eq!(turn.status(), TurnStatus::Failed(ErrorKind::Timeout));
    }

    #[test]
    fn test_complete_terminal_turn_is_noop() {
        let mut store = ConversationStore::new();
        let id = store.add_turn("q");
        store.complete_turn(id, Completion::Answered);
        // A late failure must not overwrite the answered state
        store.complete_turn(id, Completion::Failed(ErrorKind::Unknown));

        let turn = store.turn(id).unwrap();
        assert!(turn.error.is_none());
        assert_eq!(turn.status(), TurnStatus::Answered);
    }

    #[test]
    fn test_complete_unknown_id_is_noop() {
        let mut store = ConversationStore::new();
        store.complete_turn(Uuid::new_v4(), Completion::Answered);
        assert!(store.is_empty());
    }

    #[test]
    fn test_pending_turns_are_independent() {
        let mut store = ConversationStore::new();
        let first = store.add_turn("one");
        let second = store.add_turn("two");

        store.update_turn(first, StreamingUpdate::fragment("a"));
        store.update_turn(second, StreamingUpdate::fragment("b"));
        store.complete_turn(first, Completion::Answered);

        assert_eq!(store.turn(first).unwrap().answer_text(), Some("a"));
        let second_turn = store.turn(second).unwrap();
        assert_eq!(second_turn.answer_text(), Some("b"));
        assert!(second_turn.is_pending);
    }

    #[test]
    fn test_replace_turns_swaps_sequence() {
        let mut store = ConversationStore::new();
        store.add_turn("about to vanish");

        let mut replacement = Turn::new("restored");
        replacement.is_pending = false;
        store.replace_turns(vec![replacement]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.turns()[0].question, "restored");
        assert!(!store.is_response_pending());
    }
}
