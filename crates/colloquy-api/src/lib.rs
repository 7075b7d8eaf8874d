//! colloquy-api: HTTP clients for the answer and chat-history services
//!
//! This crate owns the wire side of colloquy: posting a question and
//! decoding the streamed answer, plus CRUD against the chat-history
//! service. State handling lives in colloquy-chat.

pub mod client;
pub mod error;
pub mod history;
pub mod stream;
pub mod types;

pub use client::{POLICY_REJECTED_STATUS, QnaClient};
pub use error::{Error, Result};
pub use history::HistoryClient;
pub use stream::{StreamingUpdate, UpdateStream};
pub use types::*;
