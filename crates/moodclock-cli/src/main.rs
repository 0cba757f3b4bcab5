mod refresh;
mod status;

use clap::{Parser, Subcommand};
use moodclock_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "moodclock")]
#[command(about = "Global mood clock operator commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upsert countries from the seed file, then refresh each once
    Seed {
        /// Only upsert countries; skip the initial refresh
        #[arg(long)]
        no_refresh: bool,
    },
    /// Refresh the mood snapshot of a single country
    Refresh {
        /// Two-letter country code
        #[arg(long)]
        country: String,

        /// Window size in minutes (defaults to MOODCLOCK_WINDOW_MINUTES)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        window_minutes: Option<u32>,

        /// Compute and print the snapshot without writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Refresh every country in MOODCLOCK_TOP_COUNTRIES
    RefreshAll {
        /// Window size in minutes (defaults to MOODCLOCK_WINDOW_MINUTES)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        window_minutes: Option<u32>,
    },
    /// Show the latest stored snapshots
    Status {
        /// Show one country in detail
        #[arg(long)]
        country: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = moodclock_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = connect(&config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = moodclock_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Seed { no_refresh } => {
            refresh::run_seed(&pool, &config, no_refresh).await?;
        }
        Commands::Refresh {
            country,
            window_minutes,
            dry_run,
        } => {
            let window_minutes = window_minutes.unwrap_or(config.window_minutes);
            refresh::run_refresh(&pool, &config, &country, window_minutes, dry_run).await?;
        }
        Commands::RefreshAll { window_minutes } => {
            let window_minutes = window_minutes.unwrap_or(config.window_minutes);
            refresh::run_refresh_all(&pool, &config, window_minutes).await?;
        }
        Commands::Status { country } => {
            status::run_status(&pool, country.as_deref()).await?;
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = moodclock_db::PoolConfig::from_app_config(config);
    let pool = moodclock_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests;
