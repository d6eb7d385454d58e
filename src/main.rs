mod cli;
mod config;
mod dispatcher;
mod error;
mod job;
mod report;
mod runner;
mod source;
mod ui;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::LauncherConfig;
use error::LauncherError;
use report::BatchReport;
use runner::ProcessRunner;
use ui::BatchPrinter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = execute(cli).await;
    if let Err(e) = &result {
        eprintln!("error: {e:#}");
    }
    ExitCode::from(exit_status(&result))
}

/// 0 once a batch has run, whatever its jobs returned; 2 for an invalid
/// batch configuration; 1 for anything else that stopped the batch.
fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let invalid = e
                .downcast_ref::<LauncherError>()
                .is_some_and(LauncherError::is_invalid_argument);
            if invalid { 2 } else { 1 }
        }
    }
}

/// Logs go to stderr so job output on stdout stays readable.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "explaunch=debug"
    } else {
        "explaunch=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(cli: Cli) -> Result<()> {
    let mut config = LauncherConfig::load()?;
    if let Some(java) = cli.java {
        config.java = java;
    }

    match cli.command {
        Command::Run {
            batch,
            workers,
            skip,
            report,
        } => {
            let workers = workers.unwrap_or(config.workers);
            run_batch(&config, &batch, workers, skip, report.as_deref()).await
        }
        Command::Plan { batch, skip } => plan_batch(&config, &batch, skip),
    }
}

async fn run_batch(
    config: &LauncherConfig,
    batch: &Path,
    workers: usize,
    skip: usize,
    report_path: Option<&Path>,
) -> Result<()> {
    let jobs = source::load_batch(batch, skip)
        .with_context(|| format!("failed to load batch {}", batch.display()))?;
    let runner = Arc::new(ProcessRunner::from_config(config));

    let started_at = Utc::now();
    // Outcomes are data; only configuration problems come back as errors.
    let outcomes = dispatcher::dispatch(jobs.clone(), workers, runner).await?;
    let report = BatchReport::new(&jobs, &outcomes, workers, started_at);

    let printer = BatchPrinter::default();
    printer.print_outcomes(&jobs, &outcomes);
    printer.print_summary(&report);

    if let Some(path) = report_path {
        report
            .write_to(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        tracing::info!(path = %path.display(), batch_id = %report.batch_id, "report written");
    }
    Ok(())
}

fn plan_batch(config: &LauncherConfig, batch: &Path, skip: usize) -> Result<()> {
    let jobs = source::load_batch(batch, skip)
        .with_context(|| format!("failed to load batch {}", batch.display()))?;
    for (index, job) in jobs.iter().enumerate() {
        job.validate(index)?;
    }

    let runner = ProcessRunner::from_config(config);
    let printer = BatchPrinter::default();
    for (index, job) in jobs.iter().enumerate() {
        printer.print_command(index, &runner.command_line(job));
    }
    Ok(())
}
