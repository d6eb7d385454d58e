use std::fmt;
use std::process::ExitStatus;

use serde::{Deserialize, Serialize};

use crate::error::LaunchError;

/// Lifecycle of a single job within a batch.
///
/// Each job flows through: PENDING → RUNNING → SUCCEEDED | FAILED | LAUNCH_FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[allow(dead_code)]
    Pending,
    Running,
    Succeeded,
    Failed,
    LaunchFailed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::LaunchFailed
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: JobState) -> bool {
        match self {
            JobState::Pending => next == JobState::Running,
            JobState::Running => next.is_terminal(),
            JobState::Succeeded | JobState::Failed | JobState::LaunchFailed => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "PENDING"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Succeeded => write!(f, "SUCCEEDED"),
            JobState::Failed => write!(f, "FAILED"),
            JobState::LaunchFailed => write!(f, "LAUNCH_FAILED"),
        }
    }
}

/// Terminal result of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The process ran and exited with `code`.
    Exited { code: i32 },
    /// The process ran but was killed before it could exit.
    Terminated { signal: Option<i32> },
    /// The process never started.
    LaunchFailed(LaunchError),
}

impl JobOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => JobOutcome::Exited { code },
            None => JobOutcome::Terminated {
                signal: termination_signal(status),
            },
        }
    }

    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Exited { code: 0 } => JobState::Succeeded,
            JobOutcome::Exited { .. } | JobOutcome::Terminated { .. } => JobState::Failed,
            JobOutcome::LaunchFailed(_) => JobState::LaunchFailed,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            JobOutcome::Exited { code } => Some(*code),
            _ => None,
        }
    }

    pub fn launch_error(&self) -> Option<&LaunchError> {
        match self {
            JobOutcome::LaunchFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Exited { code } => write!(f, "exit code {code}"),
            JobOutcome::Terminated { signal: Some(sig) } => write!(f, "killed by signal {sig}"),
            JobOutcome::Terminated { signal: None } => write!(f, "terminated without exit code"),
            JobOutcome::LaunchFailed(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(unix)]
fn termination_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: ExitStatus) -> Option<i32> {
    None
}
