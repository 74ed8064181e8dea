//! Error types for intake-bot.
//!
//! The conversational core never treats a user mistake as an error: bad
//! input is answered with a re-prompt. The types here cover the real
//! failure modes (delivery, configuration, export, directory guards)
//! and are handled at the single outer dispatch boundary.

use thiserror::Error;

use crate::gateway::UserId;

/// Failures in the message delivery collaborator.
///
/// These are logged and swallowed at the dispatch boundary; they never
/// propagate into session state.
#[derive(Debug, Error)]
pub enum GateError {
    /// Sending a message through the gate failed.
    #[error("failed to send via gate '{name}': {reason}")]
    SendFailed { name: String, reason: String },

    /// The gate could not start its inbound stream.
    #[error("gate '{name}' failed to start: {reason}")]
    StartupFailed { name: String, reason: String },
}

/// Configuration loading/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors from the permanent-log export collaborator.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Guard violations in the administrator directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// Removing this admin would leave the directory empty.
    #[error("cannot remove the last administrator")]
    LastAdmin,

    /// Main administrators are fixed at startup and cannot be removed.
    #[error("cannot remove a main administrator")]
    MainAdmin,

    /// The identity is not an administrator.
    #[error("unknown administrator {0}")]
    Unknown(UserId),
}
