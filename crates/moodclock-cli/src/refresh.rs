//! Seed and refresh command handlers.

use chrono::Utc;
use moodclock_core::{AppConfig, Country, MoodPublisher, MoodUpdate};
use moodclock_db::PgSnapshotStore;
use moodclock_sentiment::{Provider, ProviderConfig, RefreshSummary};

/// Publisher for CLI runs: there are no live subscribers in this process,
/// so updates are only logged.
struct LogPublisher;

impl MoodPublisher for LogPublisher {
    fn publish(&self, update: &MoodUpdate) {
        tracing::info!(
            country = %update.country,
            emoji = %update.emoji,
            mood_score = update.mood_score,
            energy = update.energy,
            "mood update"
        );
    }
}

fn build_provider(config: &AppConfig) -> anyhow::Result<Provider> {
    Ok(Provider::from_config(&ProviderConfig::from_app_config(
        config,
    ))?)
}

/// Upsert countries from the seed file and, unless `no_refresh`, refresh
/// each seeded country once.
///
/// # Errors
///
/// Returns an error if the seed file is invalid or the upsert fails.
pub(crate) async fn run_seed(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    no_refresh: bool,
) -> anyhow::Result<()> {
    let seed = moodclock_core::load_countries(&config.countries_path)?;
    let rows = moodclock_db::seed_countries(pool, &seed.countries).await?;
    println!(
        "seeded {} countries from {}",
        rows.len(),
        config.countries_path.display()
    );

    if no_refresh {
        return Ok(());
    }

    let countries: Vec<Country> = rows.into_iter().map(Country::from).collect();
    let summary = refresh_many(pool, config, &countries, config.window_minutes).await?;
    print_summary(&summary);
    Ok(())
}

/// Refresh one country. With `dry_run` the snapshot is computed and printed
/// as JSON but neither stored nor published.
///
/// # Errors
///
/// Returns an error if the country is unknown, the provider cannot be
/// built, or the snapshot cannot be stored.
pub(crate) async fn run_refresh(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    code: &str,
    window_minutes: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    let country: Country = moodclock_db::get_country_by_code(pool, code)
        .await?
        .ok_or_else(|| anyhow::anyhow!("country '{code}' not found; run `moodclock seed` first"))?
        .into();
    let provider = build_provider(config)?;

    if dry_run {
        let snapshot =
            moodclock_sentiment::build_snapshot(&country, &provider, window_minutes, Utc::now())
                .await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let store = PgSnapshotStore::new(pool.clone());
    let outcome = moodclock_sentiment::refresh_country(
        &country,
        &provider,
        &store,
        &LogPublisher,
        window_minutes,
        Utc::now(),
    )
    .await?;

    let snapshot = &outcome.snapshot;
    println!(
        "{} {} {} {:+.3} energy {:.3} {} ({} items, {} drivers, snapshot {} {})",
        snapshot.country_code,
        snapshot.window_start.format("%Y-%m-%d %H:%M"),
        snapshot.emoji,
        snapshot.mood_score,
        snapshot.energy,
        snapshot.confidence,
        snapshot.n_items,
        snapshot.drivers.len(),
        outcome.saved.id,
        if outcome.saved.inserted {
            "inserted"
        } else {
            "updated"
        },
    );
    Ok(())
}

/// Refresh every seeded country listed in `MOODCLOCK_TOP_COUNTRIES`.
///
/// # Errors
///
/// Returns an error if no top country is seeded or any refresh failed.
pub(crate) async fn run_refresh_all(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    window_minutes: u32,
) -> anyhow::Result<()> {
    let countries: Vec<Country> =
        moodclock_db::list_countries_by_codes(pool, &config.top_countries)
            .await?
            .into_iter()
            .map(Country::from)
            .collect();

    if countries.is_empty() {
        anyhow::bail!("none of the top countries are seeded; run `moodclock seed` first");
    }
    if countries.len() < config.top_countries.len() {
        tracing::warn!(
            requested = config.top_countries.len(),
            seeded = countries.len(),
            "some top countries are not seeded and will be skipped"
        );
    }

    let summary = refresh_many(pool, config, &countries, window_minutes).await?;
    print_summary(&summary);

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} country refreshes failed",
            summary.failed,
            summary.failed + summary.succeeded
        );
    }
    Ok(())
}

async fn refresh_many(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    countries: &[Country],
    window_minutes: u32,
) -> anyhow::Result<RefreshSummary> {
    let provider = build_provider(config)?;
    let store = PgSnapshotStore::new(pool.clone());

    Ok(moodclock_sentiment::refresh_all(
        countries,
        &provider,
        &store,
        &LogPublisher,
        window_minutes,
        Utc::now(),
        config.max_concurrent_refreshes,
    )
    .await)
}

fn print_summary(summary: &RefreshSummary) {
    let mut outcomes: Vec<_> = summary.outcomes.iter().collect();
    outcomes.sort_by(|a, b| a.snapshot.country_code.cmp(&b.snapshot.country_code));

    println!("{:<6}{:<8}{:<10}{:<8}ITEMS", "CODE", "EMOJI", "SCORE", "CONF");
    for outcome in outcomes {
        let s = &outcome.snapshot;
        println!(
            "{:<6}{:<8}{:<+10.3}{:<8}{}",
            s.country_code,
            s.emoji,
            s.mood_score,
            s.confidence.as_str(),
            s.n_items
        );
    }
    println!(
        "refreshed {} countries ({} failed)",
        summary.succeeded, summary.failed
    );
}
