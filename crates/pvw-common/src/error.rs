//! Error types for pvw.
//!
//! Three families surface from a refresh or terminate cycle:
//! - [`CollectionError`]: the enumeration or lookup tool failed
//! - [`ParseError`]: the enumeration text did not match the field format
//! - [`ActionError`]: a termination request failed
//!
//! None of them are fatal to the interactive loop. The controller keeps the
//! `Display` text of the most recent one as a sticky, user-visible error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pvw operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// External tool invocation errors.
    Collection,
    /// Malformed enumeration output.
    Parse,
    /// Process termination errors.
    Action,
    /// Configuration and argument errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Action => write!(f, "action"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Failure running an external collection tool.
///
/// The "nothing found" exit status of the enumeration tool is not an error
/// and never reaches this type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("failed to spawn {command}: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("{command} exited with status {code}{}", stderr_suffix(.stderr))]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("{command} killed by signal {signal}")]
    KilledBySignal { command: String, signal: i32 },

    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("I/O error reading {command} output: {reason}")]
    Io { command: String, reason: String },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Enumeration text that violates the field format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid PID {value:?} in process block {block}")]
    InvalidPid { block: usize, value: String },

    #[error("working directory lookup for PID {pid} failed: {source}")]
    WorkingDirectory {
        pid: u32,
        #[source]
        source: CollectionError,
    },
}

/// Failure terminating a process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("process {pid} not found")]
    NotFound { pid: u32 },

    #[error("permission denied terminating process {pid}")]
    PermissionDenied { pid: u32 },

    #[error("terminating process {pid} failed: {reason}")]
    Failed { pid: u32, reason: String },

    #[error("process termination is not supported on this platform")]
    Unsupported,
}

/// Unified error type for pvw.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Collection(_) => ErrorCategory::Collection,
            Error::Parse(_) => ErrorCategory::Parse,
            Error::Action(_) => ErrorCategory::Action,
            Error::Config(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }
}
