use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::AppError;
use crate::jobs::daily_pipeline_job::run_daily_pipeline;
use crate::state::AppState;

/// 09:00 UTC daily (sec min hour day month weekday).
const DAILY_SCHEDULE: &str = "0 0 9 * * *";

/// Optional in-process trigger for deployments without an external
/// cron. The pipeline's idempotency guard makes it safe to run this
/// alongside the HTTP trigger.
pub async fn start(state: AppState) -> Result<JobScheduler, AppError> {
    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| AppError::External(format!("failed to create scheduler: {e}")))?;

    let job = Job::new_async(DAILY_SCHEDULE, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            info!("scheduled daily pipeline firing");
            match run_daily_pipeline(&state.pool, &state.sources).await {
                Ok(outcome) => info!(
                    "scheduled run finished: {} ({} countries)",
                    outcome.status.as_str(),
                    outcome.countries_updated
                ),
                Err(e) => error!("scheduled run failed: {}", e),
            }
        })
    })
    .map_err(|e| AppError::External(format!("failed to build job: {e}")))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| AppError::External(format!("failed to add job: {e}")))?;
    scheduler
        .start()
        .await
        .map_err(|e| AppError::External(format!("failed to start scheduler: {e}")))?;

    info!("in-process scheduler started ({})", DAILY_SCHEDULE);
    Ok(scheduler)
}
