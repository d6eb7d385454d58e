//! Launches one job as a child process and waits for it to exit.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::job::{JobDescriptor, JobOutcome};

/// Executes a single job to completion.
///
/// Implementations must turn every per-job problem into a [`JobOutcome`];
/// nothing a single job does may fail the whole batch.
pub trait Runner: Send + Sync + 'static {
    fn run(&self, job: &JobDescriptor) -> impl Future<Output = JobOutcome> + Send;
}

/// Runs jobs as `<program> <prefix args...> <job args...>` with the child's
/// standard streams inherited from the launcher.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    prefix_args: Vec<String>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
        }
    }

    /// Runner for `java -Xms.. -Xmx.. -jar`, as configured.
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(config.java.clone(), config.jvm_args())
    }

    /// Full argument vector for `job`, program first.
    pub fn command_line(&self, job: &JobDescriptor) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.prefix_args.len() + 7);
        argv.push(self.program.clone());
        argv.extend(self.prefix_args.iter().cloned());
        argv.extend(job.program_args().iter().map(|arg| arg.to_string()));
        argv
    }
}

impl Runner for ProcessRunner {
    async fn run(&self, job: &JobDescriptor) -> JobOutcome {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(job.program_args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = LaunchError::from_io(&self.program, &e);
                warn!(experiment_id = %job.experiment_id, error = %err, "launch failed");
                return JobOutcome::LaunchFailed(err);
            }
        };
        debug!(experiment_id = %job.experiment_id, pid = ?child.id(), "child started");

        match child.wait().await {
            Ok(status) => JobOutcome::from_status(status),
            // The child exists but can no longer be observed.
            Err(e) => JobOutcome::LaunchFailed(LaunchError::from_io(&self.program, &e)),
        }
    }
}
