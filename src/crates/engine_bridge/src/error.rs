use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur while spawning or driving a simulation engine.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine executable could not be started at all.
    #[error("failed to launch engine: {0}")]
    Launch(String),
    /// A frame line carried a token that does not parse as a float.
    #[error("malformed frame token {token:?} in line {line:?}")]
    Protocol { line: String, token: String },
    /// A frame line carried the wrong number of fields for the configuration.
    #[error("frame carried {actual} fields, expected {expected}")]
    Arity { expected: usize, actual: usize },
    /// The engine produced no output within the configured read timeout.
    #[error("engine produced no frame within {0:?}")]
    Timeout(Duration),
    /// An operation was invoked in a lifecycle state that does not permit it.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A scenario file could not be loaded or saved.
    #[error("scenario error: {0}")]
    Scenario(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl BridgeError {
    pub(crate) fn launch(err: impl Into<String>) -> Self {
        BridgeError::Launch(err.into())
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        BridgeError::InvalidState(message.into())
    }

    pub(crate) fn scenario(message: impl Into<String>) -> Self {
        BridgeError::Scenario(message.into())
    }
}
