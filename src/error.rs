//! Error types for apiwire.

use thiserror::Error;

/// Main error type for all apiwire operations.
#[derive(Debug, Error)]
pub enum ApiwireError {
    /// I/O error while reading from the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A length descriptor declared a word larger than the configured limit.
    #[error("Word length {length} exceeds maximum {max}")]
    WordTooLong { length: u32, max: u32 },

    /// Word is longer than any length descriptor can carry.
    #[error("Word of {0} bytes is too long to frame")]
    Unframeable(usize),

    /// The decoder hit a frame fault earlier and refuses further input.
    #[error("Decoder poisoned by an earlier frame fault")]
    Poisoned,

    /// Character has no representation in the wire code page.
    #[error("Character {0:?} cannot be encoded in the wire code page")]
    Unencodable(char),

    /// Session task has stopped.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using ApiwireError.
pub type Result<T> = std::result::Result<T, ApiwireError>;
