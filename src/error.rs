use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Job {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("{missing} job(s) finished without reporting an outcome")]
    MissingOutcomes { missing: usize },

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LauncherError {
    /// True for errors caused by a malformed batch configuration.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            LauncherError::InvalidArgument(_) | LauncherError::MissingField { .. }
        )
    }
}

/// Why a child process could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchErrorKind {
    NotFound,
    PermissionDenied,
    InvalidArgument,
    Other,
}

impl From<io::ErrorKind> for LaunchErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => LaunchErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => LaunchErrorKind::PermissionDenied,
            io::ErrorKind::InvalidInput => LaunchErrorKind::InvalidArgument,
            _ => LaunchErrorKind::Other,
        }
    }
}

impl std::fmt::Display for LaunchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchErrorKind::NotFound => write!(f, "not found"),
            LaunchErrorKind::PermissionDenied => write!(f, "permission denied"),
            LaunchErrorKind::InvalidArgument => write!(f, "invalid argument"),
            LaunchErrorKind::Other => write!(f, "other"),
        }
    }
}

/// A child process that never started. Recorded in the job's outcome,
/// never propagated out of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("failed to launch `{program}` ({kind}): {message}")]
pub struct LaunchError {
    pub kind: LaunchErrorKind,
    pub program: String,
    pub message: String,
}

impl LaunchError {
    pub fn from_io(program: &str, err: &io::Error) -> Self {
        Self {
            kind: err.kind().into(),
            program: program.to_string(),
            message: err.to_string(),
        }
    }
}
