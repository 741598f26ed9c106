//! Background job scheduler.
//!
//! Registers the repeated processing cycle. Ticks never overlap: a tick that
//! fires while the previous cycle is still running is skipped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pitchside_pipeline::Pipeline;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Runs `work` unless another guarded run holds `guard`.
///
/// Returns `false` when the run was skipped.
pub async fn run_exclusive<F>(guard: &Mutex<()>, work: F) -> bool
where
    F: Future<Output = ()>,
{
    let Ok(_permit) = guard.try_lock() else {
        return false;
    };
    work.await;
    true
}

/// One processing cycle behind the overlap guard.
#[derive(Clone)]
pub struct CycleRunner {
    pipeline: Arc<Pipeline>,
    guard: Arc<Mutex<()>>,
}

impl CycleRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            guard: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run(&self) {
        let ran = run_exclusive(&self.guard, async {
            let now = chrono::Utc::now().naive_utc();
            tracing::info!(%now, "scheduler: starting processing cycle");
            match self.pipeline.run_cycle(now).await {
                Ok(summary) => tracing::info!(
                    eligible = summary.processing.eligible,
                    processed = summary.processing.processed,
                    failed = summary.processing.failed,
                    articles_created = summary.processing.articles_created,
                    images_generated = summary.images.as_ref().map_or(0, |i| i.generated),
                    "scheduler: processing cycle complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: processing cycle failed"),
            }
        })
        .await;

        if !ran {
            tracing::warn!("scheduler: previous processing cycle still running; skipping tick");
        }
    }
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`]; dropping it stops all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: CycleRunner,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_processing_job(&scheduler, runner, interval).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_processing_job(
    scheduler: &JobScheduler,
    runner: CycleRunner,
    interval: Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let runner = runner.clone();
        Box::pin(async move {
            runner.run().await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        interval_secs = interval.as_secs(),
        "scheduler: registered processing job"
    );
    Ok(())
}
