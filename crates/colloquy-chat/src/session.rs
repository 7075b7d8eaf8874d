//! Chat session orchestration

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use colloquy_api::{ChatSummary, HistoryClient, HistoryEntry, QuestionRequest};

use crate::{
    error::{Error, Result},
    events::ChatEvent,
    history::turns_from_history,
    store::{Completion, ConversationStore},
    transport::Transport,
    turn::{ErrorKind, Turn},
};

/// A cloneable handle for poking a session from external code.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) cancel: Arc<Mutex<CancellationToken>>,
    pub(crate) in_flight: Arc<AtomicUsize>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Abort the in-flight request, if any.
    ///
    /// Cancellation is cooperative: the transport stops producing chunks
    /// and the turn keeps whatever partial answer it accumulated.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Whether any question is currently in flight
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }
}

/// Drives one conversation: creates turns, feeds them streamed updates,
/// records final outcomes, and persists answered turns.
///
/// The session is cheap to clone; clones share the same store, handle,
/// and event channel, so UI event handlers can each hold one.
#[derive(Clone)]
pub struct ChatSession {
    store: Arc<Mutex<ConversationStore>>,
    transport: Arc<dyn Transport>,
    history: Option<Arc<HistoryClient>>,
    chat_id: Arc<Mutex<Option<String>>>,
    event_tx: broadcast::Sender<ChatEvent>,
    handle: SessionHandle,
}

impl ChatSession {
    /// Create a session over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            store: Arc::new(Mutex::new(ConversationStore::new())),
            transport,
            history: None,
            chat_id: Arc::new(Mutex::new(None)),
            event_tx,
            handle: SessionHandle::new(),
        }
    }

    /// Persist answered turns through the given history client
    pub fn with_history(mut self, history: HistoryClient) -> Self {
        self.history = Some(Arc::new(history));
        self
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for aborting from external code
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Abort the in-flight request, if any
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Snapshot of the current turn sequence, in chronological order
    pub fn turns(&self) -> Vec<Turn> {
        self.store.lock().turns().to_vec()
    }

    /// Snapshot of one turn by id
    pub fn turn(&self, id: Uuid) -> Option<Turn> {
        self.store.lock().turn(id).cloned()
    }

    /// Whether the most recent turn is still awaiting its answer
    pub fn is_response_pending(&self) -> bool {
        self.store.lock().is_response_pending()
    }

    /// The persisted chat this session is attached to, if any
    pub fn chat_id(&self) -> Option<String> {
        self.chat_id.lock().clone()
    }

    /// Submit a question and drive its update stream to a terminal state.
    ///
    /// Returns the id of the turn it created. Transport failures are not
    /// returned: they are classified and recorded on the turn, which is
    /// the caller-visible outcome. Submitting while a previous question
    /// is pending creates an independent turn.
    pub async fn ask(&self, question: &str) -> Uuid {
        let question = sanitize(question);

        // A fresh token per request; abort() only reaches the latest one,
        // as does replacing it here.
        *self.handle.cancel.lock() = CancellationToken::new();
        let cancel = self.handle.cancel.lock().clone();
        self.handle.in_flight.fetch_add(1, Ordering::AcqRel);

        let id = self.store.lock().add_turn(question.clone());
        let _ = self.event_tx.send(ChatEvent::TurnStarted {
            id,
            question: question.clone(),
        });

        let mut request = QuestionRequest::new(question);
        if let Some(chat_id) = self.chat_id.lock().clone() {
            request = request.with_history_id(chat_id);
        }

        let outcome = self.run_stream(id, &request, cancel).await;

        self.store.lock().complete_turn(id, outcome);
        let _ = self.event_tx.send(match outcome {
            Completion::Answered => ChatEvent::TurnCompleted { id },
            Completion::Failed(kind) => ChatEvent::TurnFailed { id, kind },
            Completion::Cancelled => ChatEvent::TurnCancelled { id },
        });

        self.handle.in_flight.fetch_sub(1, Ordering::AcqRel);

        self.save_turn(id).await;

        id
    }

    /// Consume the update stream for one turn, applying every chunk in
    /// delivery order, and decide the terminal outcome.
    async fn run_stream(
        &self,
        id: Uuid,
        request: &QuestionRequest,
        cancel: CancellationToken,
    ) -> Completion {
        let mut stream = match self.transport.post_question(request, cancel.clone()).await {
            Ok(stream) => stream,
            Err(e) if e.is_abort() => return Completion::Cancelled,
            Err(e) => {
                tracing::debug!("question failed before streaming: {}", e);
                return Completion::Failed(ErrorKind::classify(&e));
            }
        };

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return Completion::Cancelled,
                item = stream.next() => item,
            };

            match item {
                Some(Ok(update)) => {
                    self.store.lock().update_turn(id, update.clone());
                    let _ = self.event_tx.send(ChatEvent::TurnUpdated { id, update });
                }
                Some(Err(e)) if e.is_abort() => return Completion::Cancelled,
                Some(Err(e)) => {
                    tracing::debug!("stream for turn {} failed: {}", id, e);
                    return Completion::Failed(ErrorKind::classify(&e));
                }
                None => return Completion::Answered,
            }
        }
    }

    /// Persist a finished turn when it produced answer text.
    ///
    /// Save failures are logged and swallowed; persistence is best-effort
    /// and never changes turn state.
    async fn save_turn(&self, id: Uuid) {
        let Some(ref history) = self.history else {
            return;
        };

        let entry = {
            let store = self.store.lock();
            let Some(turn) = store.turn(id) else { return };
            if !should_save(turn) {
                return;
            }
            let mut entry = HistoryEntry::new(
                turn.question.clone(),
                turn.answer_text().unwrap_or_default(),
            );
            entry.timestamp = Some(chrono::Utc::now());
            if !turn.sources.is_empty() {
                entry = entry.with_sources(turn.sources.clone());
            }
            entry
        };

        let chat_id = self.chat_id.lock().clone();
        match history.save_chat(&[entry], chat_id.as_deref()).await {
            Ok(summary) => {
                *self.chat_id.lock() = Some(summary.id);
            }
            Err(e) => {
                tracing::warn!("failed to save chat history: {}", e);
            }
        }
    }

    /// Load a persisted chat, replacing the current conversation.
    ///
    /// Any in-flight request is aborted first; its late chunks land on
    /// turns that no longer exist and are dropped by the store.
    pub async fn load_chat(&self, id: &str) -> Result<()> {
        self.abort();

        let history = self.history.as_ref().ok_or(Error::HistoryUnavailable)?;
        let record = history.get_chat(id).await?;

        self.store
            .lock()
            .replace_turns(turns_from_history(&record.history));
        *self.chat_id.lock() = Some(record.history_id);
        Ok(())
    }

    /// List persisted chats through the configured history client
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let history = self.history.as_ref().ok_or(Error::HistoryUnavailable)?;
        Ok(history.list_chats().await?)
    }

    /// Start a fresh conversation, aborting any in-flight request
    pub fn new_chat(&self) {
        self.abort();
        *self.chat_id.lock() = None;
        self.store.lock().reset();
    }
}

/// Whether a finished turn is worth persisting: it must have produced
/// answer text and not have failed.
fn should_save(turn: &Turn) -> bool {
    if turn.error.is_some() {
        return false;
    }
    turn.answer_text()
        .is_some_and(|text| !text.trim().is_empty())
}

/// Trim the question and drop control characters before it becomes a
/// turn; newlines survive, multi-line questions are legitimate.
fn sanitize(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect()
}
