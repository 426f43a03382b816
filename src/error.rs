//! Failure taxonomy for a migration run.
//!
//! Every failure a run can surface is one of these variants. None of them is
//! retried; all propagate to the caller. Staged-branch teardown is attempted
//! on the way out and its own failures are reported without replacing the
//! original error.

use std::path::PathBuf;

use thiserror::Error;

use crate::projection::Field;

/// Errors from configuration, forge calls, and git subprocesses.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent settings. Raised at load time; a run with a
    /// configuration error never starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// A forge rejected a read or write call.
    #[error("{provider} API error: {message}")]
    RemoteApi { provider: String, message: String },

    /// Clone, branch creation, or push failed while staging PR branches.
    #[error("branch staging failed: {0}")]
    Staging(String),

    /// `git diff` reported an error.
    #[error("diff generation failed: {0}")]
    DiffGeneration(String),

    /// Diff storage directory vanished after configuration validation.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The target provider does not support posting at all.
    #[error("posting is not supported for {0}")]
    Unsupported(&'static str),

    /// A projection reached a writer without a field the operation requires.
    #[error("missing required field: {0}")]
    MissingField(Field),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for API failures, used by the adapters.
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
