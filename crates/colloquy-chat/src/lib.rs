//! colloquy-chat: conversation state core
//!
//! This crate owns the client-side lifecycle of a chat conversation:
//! the turn model, the streaming update reducer, the conversation store,
//! and the session orchestration that ties them to a transport.

pub mod error;
pub mod events;
pub mod history;
pub mod reducer;
pub mod session;
pub mod sources;
pub mod store;
pub mod transport;
pub mod turn;

pub use error::{Error, Result};
pub use events::ChatEvent;
pub use history::turns_from_history;
pub use reducer::apply_update;
pub use session::{ChatSession, SessionHandle};
pub use sources::parse_sources;
pub use store::{Completion, ConversationStore};
pub use transport::{ServiceTransport, Transport};
pub use turn::{Answer, ErrorKind, Turn, TurnStatus};
