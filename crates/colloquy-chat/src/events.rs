//! Session event types

use crate::turn::ErrorKind;
use colloquy_api::StreamingUpdate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted while a session processes a question.
///
/// The store remains the source of truth; events exist so observers can
/// render incrementally without polling it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A pending turn was created
    TurnStarted { id: Uuid, question: String },

    /// An update was applied to the turn
    TurnUpdated { id: Uuid, update: StreamingUpdate },

    /// The turn finished with its accumulated answer
    TurnCompleted { id: Uuid },

    /// The turn failed with a classified error
    TurnFailed { id: Uuid, kind: ErrorKind },

    /// The turn was cancelled, keeping any partial answer
    TurnCancelled { id: Uuid },
}

impl ChatEvent {
    /// Check if this event ends its turn
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::TurnCompleted { .. }
                | ChatEvent::TurnFailed { .. }
                | ChatEvent::TurnCancelled { .. }
        )
    }

    /// The id of the turn this event belongs to
    pub fn turn_id(&self) -> Uuid {
        match self {
            ChatEvent::TurnStarted { id, .. }
            | ChatEvent::TurnUpdated { id, .. }
            | ChatEvent::TurnCompleted { id }
            | ChatEvent::TurnFailed { id, .. }
            | ChatEvent::TurnCancelled { id } => *id,
        }
    }
}
