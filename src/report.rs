use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LaunchError, LauncherError};
use crate::job::{JobDescriptor, JobOutcome, JobState};

/// One line of the batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial: Option<String>,
    pub experiment_id: String,
    pub state: JobState,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_error: Option<LaunchError>,
}

/// Structured record of a finished batch, written with `run --report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub workers: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub succeeded: usize,
    pub failed: usize,
    pub launch_failed: usize,
    pub jobs: Vec<JobRecord>,
}

impl BatchReport {
    pub fn new(
        jobs: &[JobDescriptor],
        outcomes: &[JobOutcome],
        workers: usize,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        let records: Vec<JobRecord> = jobs
            .iter()
            .zip(outcomes)
            .enumerate()
            .map(|(index, (job, outcome))| JobRecord {
                index,
                trial: job.trial.clone(),
                experiment_id: job.experiment_id.clone(),
                state: outcome.state(),
                exit_code: outcome.exit_code(),
                launch_error: outcome.launch_error().cloned(),
            })
            .collect();

        let count = |state: JobState| records.iter().filter(|r| r.state == state).count();

        Self {
            batch_id: Uuid::new_v4().to_string(),
            workers,
            started_at,
            completed_at,
            duration_ms: (completed_at - started_at).num_milliseconds(),
            succeeded: count(JobState::Succeeded),
            failed: count(JobState::Failed),
            launch_failed: count(JobState::LaunchFailed),
            jobs: records,
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), LauncherError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
