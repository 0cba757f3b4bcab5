//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring batch refresh of the top countries.

use std::sync::Arc;

use chrono::Utc;
use moodclock_core::{AppConfig, Country};
use moodclock_db::PgSnapshotStore;
use moodclock_sentiment::Provider;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::broadcast::MoodBroadcaster;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    provider: Arc<Provider>,
    broadcaster: MoodBroadcaster,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_refresh_job(&scheduler, pool, config, provider, broadcaster).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the batch refresh on `MOODCLOCK_REFRESH_CRON`.
///
/// Each tick refreshes `MOODCLOCK_TOP_COUNTRIES` for the window containing
/// the tick time and pushes every saved snapshot to WebSocket subscribers.
async fn register_refresh_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    provider: Arc<Provider>,
    broadcaster: MoodBroadcaster,
) -> Result<(), JobSchedulerError> {
    let store = Arc::new(PgSnapshotStore::new(pool.clone()));
    let pool = Arc::new(pool);
    let cron = config.refresh_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let provider = Arc::clone(&provider);
        let store = Arc::clone(&store);
        let broadcaster = broadcaster.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting mood refresh run");
            run_refresh_job(&pool, &config, &provider, &store, &broadcaster).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: mood refresh job registered");
    Ok(())
}

async fn run_refresh_job(
    pool: &PgPool,
    config: &AppConfig,
    provider: &Provider,
    store: &PgSnapshotStore,
    broadcaster: &MoodBroadcaster,
) {
    let countries: Vec<Country> =
        match moodclock_db::list_countries_by_codes(pool, &config.top_countries).await {
            Ok(rows) => rows.into_iter().map(Country::from).collect(),
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to load top countries");
                return;
            }
        };

    if countries.is_empty() {
        tracing::warn!("scheduler: no seeded top countries; skipping refresh");
        return;
    }

    let summary = moodclock_sentiment::refresh_all(
        &countries,
        provider,
        store,
        broadcaster,
        config.window_minutes,
        Utc::now(),
        config.max_concurrent_refreshes,
    )
    .await;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        subscribers = broadcaster.subscriber_count(),
        "scheduler: mood refresh run complete"
    );
}
