//! Error types for relay.
//!
//! Every workflow failure ends up as one of these variants. None of them are
//! retried; the CLI prints the message plus [`Error::hint`] and exits
//! non-zero.

use thiserror::Error;

use crate::db::DatabaseError;

/// Result type alias using relay's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Workflow error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing API keys, project configuration, or repositories.
    #[error("{message}")]
    ConfigurationMissing { message: String, hint: String },

    /// Repository, issue, or worktree lookup miss.
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate repository name/path or worktree branch.
    #[error("{0} already exists")]
    Conflict(String),

    /// Not a repository, empty repository, branch problems, dirty removal.
    #[error("{0}")]
    GitState(String),

    /// Tracker or generator call failed.
    #[error("{service} request failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    /// Editor binary missing or exited non-zero.
    #[error("Failed to open editor: {0}")]
    EditorLaunch(String),

    /// The remote issue exists but a later local step failed. Never rolled back.
    #[error("Issue {identifier} was created, but {source}")]
    PartialSuccess {
        identifier: String,
        #[source]
        source: Box<Error>,
    },

    /// The operator declined a confirmation or aborted a prompt.
    #[error("Cancelled")]
    Cancelled,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog failure other than lookup misses and conflicts
    #[error("Catalog error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn missing(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }

    /// Next command the operator should run to recover, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConfigurationMissing { hint, .. } => Some(hint.clone()),
            Self::NotFound(_) => Some("See what is cataloged with: relay repo list / relay list".into()),
            Self::Conflict(_) => Some("Inspect existing entries with: relay repo list".into()),
            Self::GitState(_) => {
                Some("Inspect the repository with: git status && git worktree list".into())
            }
            Self::ExternalService { .. } => {
                Some("Check your API keys with: relay config show".into())
            }
            Self::EditorLaunch(_) => Some(
                "Make sure the editor launcher is on PATH, or run: relay config set-editor <editor>"
                    .into(),
            ),
            Self::PartialSuccess { identifier, .. } => Some(format!(
                "Fix the cause and run: relay open {identifier} (or close the issue in the tracker)"
            )),
            Self::Config(_) => Some("Re-run: relay setup".into()),
            Self::Cancelled | Self::Storage(_) | Self::Json(_) | Self::Io(_) => None,
        }
    }
}

impl From<DatabaseError> for Error {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            DatabaseError::Conflict(what) => Self::Conflict(what),
            other => Self::Storage(other.to_string()),
        }
    }
}
