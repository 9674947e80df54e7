//! Unified error handling for commandeer.
//!
//! Each concern gets its own error enum: registration, handler execution,
//! owner-thread marshaling and the end-to-end dispatch pipeline. Dispatch
//! errors know how to render themselves for the caller and how to label
//! themselves for metrics.

use crate::commands::PermissionLevel;
use crate::server::CallerId;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while adding a command to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("command path is empty")]
    EmptyPath,

    /// The first registration is kept; the later one is rejected.
    #[error("command path {0} is already registered")]
    Duplicate(String),
}

// ============================================================================
// Handler Errors (command execution)
// ============================================================================

/// Errors returned by command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Arguments don't fit the declared parameter shape.
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("{0}")]
    Failed(String),
}

/// Result type for command handlers.
pub type CommandResult = Result<(), CommandError>;

// ============================================================================
// Marshal Errors (owner-thread invocation)
// ============================================================================

/// Errors reported to callers of the owner-thread marshal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The caller stopped waiting. The action is still queued and will run.
    #[error("owner thread action timed out after {0:?}")]
    Timeout(Duration),

    #[error("owner thread action panicked")]
    Faulted,

    #[error("owner thread is no longer running")]
    Closed,
}

// ============================================================================
// Dispatch Errors
// ============================================================================

/// Errors that end a dispatch before (or instead of) a handler response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{path} requires {required} or higher")]
    Unauthorized {
        path: String,
        required: PermissionLevel,
    },

    /// Identity resolution failed for a caller-originated message.
    #[error("command invoked by nonexistent caller {0}")]
    UnknownCaller(CallerId),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("command handler panicked")]
    Faulted,

    #[error("owner thread is no longer running")]
    Closed,
}

impl DispatchError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::Unauthorized { .. } => "unauthorized",
            Self::UnknownCaller(_) => "unknown_caller",
            Self::Timeout(_) => "timeout",
            Self::Faulted => "faulted",
            Self::Closed => "closed",
        }
    }

    /// Text to show the caller.
    ///
    /// Returns `None` for errors where the message is dropped without a
    /// reply.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::UnknownCommand(text) => Some(format!("Unknown command: {text}")),
            Self::Unauthorized { required, .. } => Some(format!(
                "You need to be a {required} or higher to use that command."
            )),
            Self::Timeout(_) => Some("The command timed out.".to_string()),
            Self::Faulted => Some("The command failed.".to_string()),
            Self::UnknownCaller(_) | Self::Closed => None,
        }
    }
}

impl From<MarshalError> for DispatchError {
    fn from(err: MarshalError) -> Self {
        match err {
            MarshalError::Timeout(d) => Self::Timeout(d),
            MarshalError::Faulted => Self::Faulted,
            MarshalError::Closed => Self::Closed,
        }
    }
}
