//! Bounded-concurrency dispatch of a job batch.
//!
//! A fixed pool of workers claims jobs from a shared cursor in input order
//! and runs each one through a [`Runner`]. Outcomes are written back by
//! index, so the returned vector lines up with the input regardless of
//! which job finished first.
//!
//! There is no timeout and no cancellation: a child that never exits keeps
//! its worker busy, and the batch with it, indefinitely.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::LauncherError;
use crate::job::{JobDescriptor, JobOutcome, JobState};
use crate::runner::Runner;

/// Runs every job in `jobs` with at most `max_concurrency` running at once
/// and returns their outcomes in input order.
///
/// Fails only on configuration problems, before anything is started:
/// `max_concurrency == 0` or a descriptor with a missing field. Launch
/// failures and nonzero exits are recorded in the outcomes.
pub async fn dispatch<R: Runner>(
    jobs: Vec<JobDescriptor>,
    max_concurrency: usize,
    runner: Arc<R>,
) -> Result<Vec<JobOutcome>, LauncherError> {
    if max_concurrency == 0 {
        return Err(LauncherError::InvalidArgument(
            "max concurrency must be at least 1".into(),
        ));
    }
    for (index, job) in jobs.iter().enumerate() {
        job.validate(index)?;
    }
    if jobs.is_empty() {
        return Ok(Vec::new());
    }

    let total = jobs.len();
    let workers = max_concurrency.min(total);
    info!(jobs = total, workers, "dispatching batch");

    let jobs: Arc<[JobDescriptor]> = jobs.into();
    let cursor = Arc::new(AtomicUsize::new(0));

    let mut pool = JoinSet::new();
    for worker in 0..workers {
        pool.spawn(work(
            worker,
            Arc::clone(&jobs),
            Arc::clone(&cursor),
            Arc::clone(&runner),
        ));
    }

    // A failed worker does not stop the others: every task is joined so no
    // child is left running unobserved when the error is returned.
    let mut slots: Vec<Option<JobOutcome>> = vec![None; total];
    let mut failure = None;
    while let Some(finished) = pool.join_next().await {
        match finished {
            Ok(done) => {
                for (index, outcome) in done {
                    slots[index] = Some(outcome);
                }
            }
            Err(e) => {
                error!(error = %e, "worker task failed");
                failure.get_or_insert(e);
            }
        }
    }
    if let Some(e) = failure {
        return Err(LauncherError::Worker(e));
    }

    let outcomes = collect_slots(slots)?;

    let succeeded = outcomes
        .iter()
        .filter(|o| o.state() == JobState::Succeeded)
        .count();
    info!(jobs = total, succeeded, failed = total - succeeded, "batch finished");

    Ok(outcomes)
}

/// Unwraps the result slots, failing if any job never reported back.
fn collect_slots(slots: Vec<Option<JobOutcome>>) -> Result<Vec<JobOutcome>, LauncherError> {
    let total = slots.len();
    let outcomes: Vec<JobOutcome> = slots.into_iter().flatten().collect();
    if outcomes.len() != total {
        error!(expected = total, received = outcomes.len(), "outcomes missing");
        return Err(LauncherError::MissingOutcomes {
            missing: total - outcomes.len(),
        });
    }
    Ok(outcomes)
}

/// One pool worker: claim the next index, run it, repeat until the batch
/// is exhausted. Returns the `(index, outcome)` pairs it produced.
async fn work<R: Runner>(
    worker: usize,
    jobs: Arc<[JobDescriptor]>,
    cursor: Arc<AtomicUsize>,
    runner: Arc<R>,
) -> Vec<(usize, JobOutcome)> {
    let mut done = Vec::new();
    loop {
        let index = cursor.fetch_add(1, Ordering::SeqCst);
        let Some(job) = jobs.get(index) else {
            break;
        };

        debug!(worker, index, label = job.label(), state = %JobState::Running, "job claimed");
        let outcome = runner.run(job).await;
        debug_assert!(JobState::Running.can_transition_to(outcome.state()));
        debug!(worker, index, label = job.label(), state = %outcome.state(), %outcome, "job finished");

        done.push((index, outcome));
    }
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use crate::error::{LaunchError, LaunchErrorKind};
    use crate::runner::ProcessRunner;

    fn job(n: usize) -> JobDescriptor {
        JobDescriptor {
            trial: Some(format!("{n}")),
            jar_file: "target/app.jar".into(),
            dataset: "vehicle".into(),
            algorithm_id: "Basic/vehicle_Basic".into(),
            experiment_id: format!("trial{n}"),
            parallel_cores: "6".into(),
            train_file: format!("train{n}.dat"),
            test_file: format!("test{n}.dat"),
        }
    }

    fn batch(len: usize) -> Vec<JobDescriptor> {
        (0..len).map(job).collect()
    }

    fn trial_number(job: &JobDescriptor) -> usize {
        job.experiment_id
            .trim_start_matches("trial")
            .parse()
            .unwrap()
    }

    /// Sleeps a per-job duration, exits with the job number, and records
    /// how many jobs were running at the same time.
    struct MockRunner {
        running: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        started: Mutex<Vec<usize>>,
        delay: fn(usize) -> Duration,
    }

    impl MockRunner {
        fn with_delay(delay: fn(usize) -> Duration) -> Self {
            Self {
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
                delay,
            }
        }
    }

    impl Default for MockRunner {
        fn default() -> Self {
            Self::with_delay(|_| Duration::ZERO)
        }
    }

    impl Runner for MockRunner {
        async fn run(&self, job: &JobDescriptor) -> JobOutcome {
            let n = trial_number(job);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.lock().unwrap().push(n);
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep((self.delay)(n)).await;

            self.running.fetch_sub(1, Ordering::SeqCst);
            expected(n)
        }
    }

    /// Every fifth job starting at 3 fails to launch; the rest exit with
    /// their own index.
    fn expected(n: usize) -> JobOutcome {
        if n % 5 == 3 {
            JobOutcome::LaunchFailed(LaunchError {
                kind: LaunchErrorKind::NotFound,
                program: "java".into(),
                message: "mock".into(),
            })
        } else {
            JobOutcome::Exited { code: n as i32 }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn outcomes_follow_input_order_for_any_pool_size() {
        // Later jobs finish first.
        let delay: fn(usize) -> Duration = |n| Duration::from_millis((12 - n as u64) * 3);
        for workers in [1, 2, 3, 4, 12, 50] {
            let runner = Arc::new(MockRunner::with_delay(delay));
            let outcomes = dispatch(batch(12), workers, runner.clone()).await.unwrap();

            assert_eq!(outcomes.len(), 12);
            for (i, outcome) in outcomes.iter().enumerate() {
                assert_eq!(outcome, &expected(i), "workers = {workers}, index = {i}");
            }
            assert_eq!(runner.calls.load(Ordering::SeqCst), 12);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_concurrency_limit() {
        let runner = Arc::new(MockRunner::with_delay(|_| Duration::from_millis(20)));
        dispatch(batch(16), 3, runner.clone()).await.unwrap();

        assert_eq!(runner.peak.load(Ordering::SeqCst), 3);
        assert_eq!(runner.running.load(Ordering::SeqCst), 0);
    }

    /// Panics on one chosen job and counts how many other jobs finished.
    struct PanicOn {
        index: usize,
        finished: AtomicUsize,
    }

    impl Runner for PanicOn {
        async fn run(&self, job: &JobDescriptor) -> JobOutcome {
            let n = trial_number(job);
            if n == self.index {
                panic!("runner failed on job {n}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            JobOutcome::Exited { code: 0 }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn worker_panic_waits_for_remaining_jobs() {
        let runner = Arc::new(PanicOn {
            index: 1,
            finished: AtomicUsize::new(0),
        });
        let err = dispatch(batch(8), 3, runner.clone()).await.unwrap_err();

        assert!(matches!(err, LauncherError::Worker(_)), "{err:?}");
        // The surviving workers ran every other job to completion.
        assert_eq!(runner.finished.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn complete_slots_are_unwrapped_in_order() {
        let slots = vec![
            Some(JobOutcome::Exited { code: 0 }),
            Some(JobOutcome::Exited { code: 2 }),
        ];
        assert_eq!(
            collect_slots(slots).unwrap(),
            vec![JobOutcome::Exited { code: 0 }, JobOutcome::Exited { code: 2 }]
        );
    }

    #[test]
    fn missing_slot_is_an_error() {
        let slots = vec![Some(JobOutcome::Exited { code: 0 }), None, None];
        assert!(matches!(
            collect_slots(slots),
            Err(LauncherError::MissingOutcomes { missing: 2 })
        ));
    }

    #[tokio::test]
    async fn single_worker_runs_strictly_in_order() {
        let runner = Arc::new(MockRunner::default());
        dispatch(batch(6), 1, runner.clone()).await.unwrap();

        assert_eq!(*runner.started.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_batch_runs_nothing() {
        let runner = Arc::new(MockRunner::default());
        let outcomes = dispatch(Vec::new(), 4, runner.clone()).await.unwrap();

        assert!(outcomes.is_empty());
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected_before_running() {
        let runner = Arc::new(MockRunner::default());
        let err = dispatch(batch(3), 0, runner.clone()).await.unwrap_err();

        assert!(matches!(err, LauncherError::InvalidArgument(_)));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_descriptor_aborts_whole_batch() {
        let runner = Arc::new(MockRunner::default());
        let mut jobs = batch(5);
        jobs[4].dataset.clear();

        let err = dispatch(jobs, 2, runner.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            LauncherError::MissingField {
                index: 4,
                field: "dataset"
            }
        ));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn per_job_failures_do_not_abort_batch() {
        let runner = Arc::new(MockRunner::default());
        let outcomes = dispatch(batch(10), 2, runner).await.unwrap();

        assert_eq!(outcomes[3].state(), JobState::LaunchFailed);
        assert_eq!(outcomes[8].state(), JobState::LaunchFailed);
        assert_eq!(outcomes[0], JobOutcome::Exited { code: 0 });
        assert_eq!(outcomes[9], JobOutcome::Exited { code: 9 });
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn real_processes_run_in_parallel_waves() {
        let runner = Arc::new(ProcessRunner::new(
            "sh",
            vec!["-c".into(), "sleep 0.1".into(), "explaunch".into()],
        ));

        let start = Instant::now();
        let outcomes = dispatch(batch(10), 4, runner).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(outcomes, vec![JobOutcome::Exited { code: 0 }; 10]);
        // ceil(10 / 4) = 3 waves of 100ms; serial would take a full second.
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(900), "{elapsed:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn real_nonzero_exit_is_an_outcome() {
        let runner = Arc::new(ProcessRunner::new(
            "sh",
            vec!["-c".into(), "exit 2".into(), "explaunch".into()],
        ));
        let outcomes = dispatch(batch(1), 1, runner).await.unwrap();
        assert_eq!(outcomes, vec![JobOutcome::Exited { code: 2 }]);
    }

    /// Treats each job's jar path as the program itself, so a single batch
    /// can mix launchable and missing programs.
    struct JarAsProgram;

    impl Runner for JarAsProgram {
        async fn run(&self, job: &JobDescriptor) -> JobOutcome {
            ProcessRunner::new(job.jar_file.clone(), Vec::new())
                .run(job)
                .await
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_program_fails_only_that_job() {
        let mut jobs = batch(3);
        for job in &mut jobs {
            job.jar_file = "true".into();
        }
        jobs[1].jar_file = "/nonexistent/explaunch-java".into();

        let outcomes = dispatch(jobs, 2, Arc::new(JarAsProgram)).await.unwrap();
        assert_eq!(outcomes[0], JobOutcome::Exited { code: 0 });
        assert_eq!(outcomes[1].state(), JobState::LaunchFailed);
        assert_eq!(
            outcomes[1].launch_error().map(|e| e.kind),
            Some(LaunchErrorKind::NotFound)
        );
        assert_eq!(outcomes[2], JobOutcome::Exited { code: 0 });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unlaunchable_program_is_recorded_per_job() {
        let runner = Arc::new(ProcessRunner::new("/nonexistent/java", Vec::new()));
        let outcomes = dispatch(batch(3), 2, runner).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        for outcome in &outcomes {
            assert_eq!(
                outcome.launch_error().map(|e| e.kind),
                Some(LaunchErrorKind::NotFound)
            );
        }
    }
}
