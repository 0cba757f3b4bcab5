mod api;
mod broadcast;
mod middleware;
mod scheduler;

use std::sync::Arc;

use moodclock_sentiment::{Provider, ProviderConfig};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    broadcast::{MoodBroadcaster, BROADCAST_CAPACITY},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(moodclock_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = moodclock_db::PoolConfig::from_app_config(&config);
    let pool = moodclock_db::connect_pool(&config.database_url, pool_config).await?;
    moodclock_db::run_migrations(&pool).await?;

    let provider = Arc::new(Provider::from_config(&ProviderConfig::from_app_config(
        &config,
    ))?);

    let broadcaster = MoodBroadcaster::new(BROADCAST_CAPACITY);
    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&config),
        provider,
        broadcaster.clone(),
    )
    .await?;

    let app = build_app(AppState { pool, broadcaster });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "moodclock server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
