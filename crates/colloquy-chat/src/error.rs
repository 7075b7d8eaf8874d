//! Error types for colloquy-chat

use thiserror::Error;

/// Result type alias using colloquy-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the transport layer
    #[error(transparent)]
    Api(#[from] colloquy_api::Error),

    /// The session has no history client configured
    #[error("no history client configured for this session")]
    HistoryUnavailable,
}
