//! Error types for the relay.

use thiserror::Error;

/// Errors raised while reading commands or configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    /// Command does not have the `<amount> <from> to <to>` shape.
    #[error("Malformed command: {input}")]
    MalformedCommand { input: String },

    /// Amount is not a finite number.
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: String },

    /// Slash command the relay does not handle.
    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    /// Configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
