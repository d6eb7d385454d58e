//! Batch files: where job descriptors come from.
//!
//! A batch file lists jobs explicitly, describes a parameter sweep, or both.
//! `.json` files are read as JSON, anything else as TOML.

use std::path::Path;

use serde::Deserialize;

use crate::error::LauncherError;
use crate::job::JobDescriptor;

/// Upper bound on the jobs a single sweep may expand to.
pub const MAX_SWEEP_JOBS: usize = 1_000_000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub jobs: Vec<JobDescriptor>,

    #[serde(default)]
    pub sweep: Option<Sweep>,
}

/// The nested `i`/`j` trial grid of one dataset.
///
/// Templates may reference `{dataset}`, `{i}` and `{j}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Sweep {
    pub dataset: String,
    pub jar_file: String,
    pub parallel_cores: String,
    pub algorithm_id: String,
    pub experiment_id: String,
    pub train_file: String,
    pub test_file: String,
    pub outer: usize,
    pub inner: usize,
}

impl Sweep {
    /// Number of jobs the grid expands to, rejecting grids larger than
    /// [`MAX_SWEEP_JOBS`].
    pub fn job_count(&self) -> Result<usize, LauncherError> {
        match self.outer.checked_mul(self.inner) {
            Some(count) if count <= MAX_SWEEP_JOBS => Ok(count),
            _ => Err(LauncherError::InvalidArgument(format!(
                "sweep of {} x {} jobs exceeds the limit of {MAX_SWEEP_JOBS}",
                self.outer, self.inner
            ))),
        }
    }

    /// Expands the grid row-major: all `j` for `i = 0`, then `i = 1`, ...
    pub fn expand(&self) -> Result<Vec<JobDescriptor>, LauncherError> {
        let mut jobs = Vec::with_capacity(self.job_count()?);
        for i in 0..self.outer {
            for j in 0..self.inner {
                let fill = |template: &str| render(template, &self.dataset, i, j);
                jobs.push(JobDescriptor {
                    trial: Some(format!("{i}_{j}")),
                    jar_file: fill(&self.jar_file),
                    dataset: self.dataset.clone(),
                    algorithm_id: fill(&self.algorithm_id),
                    experiment_id: fill(&self.experiment_id),
                    parallel_cores: self.parallel_cores.clone(),
                    train_file: fill(&self.train_file),
                    test_file: fill(&self.test_file),
                });
            }
        }
        Ok(jobs)
    }
}

fn render(template: &str, dataset: &str, i: usize, j: usize) -> String {
    template
        .replace("{dataset}", dataset)
        .replace("{i}", &i.to_string())
        .replace("{j}", &j.to_string())
}

impl BatchFile {
    pub fn parse(contents: &str, json: bool) -> Result<Self, LauncherError> {
        if json {
            Ok(serde_json::from_str(contents)?)
        } else {
            Ok(toml::from_str(contents)?)
        }
    }

    pub fn load(path: &Path) -> Result<Self, LauncherError> {
        let contents = std::fs::read_to_string(path)?;
        let json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        Self::parse(&contents, json)
    }

    /// Explicit jobs first, then the sweep, in order.
    pub fn into_jobs(self) -> Result<Vec<JobDescriptor>, LauncherError> {
        let mut jobs = self.jobs;
        if let Some(sweep) = &self.sweep {
            jobs.extend(sweep.expand()?);
        }
        Ok(jobs)
    }
}

/// Loads `path` and drops the first `skip` jobs, for resuming a batch that
/// was interrupted part-way through.
pub fn load_batch(path: &Path, skip: usize) -> Result<Vec<JobDescriptor>, LauncherError> {
    let jobs = BatchFile::load(path)?.into_jobs()?;
    Ok(jobs.into_iter().skip(skip).collect())
}
