//! Read-only status command.

use anyhow::Context;

/// Print the latest snapshot of every country, or one country in detail.
///
/// # Errors
///
/// Returns an error if the country is unknown or a query fails.
pub(crate) async fn run_status(pool: &sqlx::PgPool, country: Option<&str>) -> anyhow::Result<()> {
    match country {
        Some(code) => print_country(pool, code).await,
        None => print_all(pool).await,
    }
}

async fn print_all(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let snapshots = moodclock_db::list_latest_per_country(pool).await?;

    if snapshots.is_empty() {
        println!("no mood snapshots found; run `moodclock refresh-all` first");
        return Ok(());
    }

    println!(
        "{:<6}{:<18}{:<6}{:<8}{:<10}{:<8}ITEMS",
        "CODE", "WINDOW", "MIN", "EMOJI", "SCORE", "CONF"
    );
    for snap in &snapshots {
        let window = snap.window_start.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<6}{:<18}{:<6}{:<8}{:<+10.3}{:<8}{}",
            snap.country_code,
            window,
            snap.window_minutes,
            snap.emoji,
            snap.mood_score,
            snap.confidence,
            snap.n_items
        );
    }

    Ok(())
}

async fn print_country(pool: &sqlx::PgPool, code: &str) -> anyhow::Result<()> {
    let country = moodclock_db::get_country_by_code(pool, code)
        .await?
        .with_context(|| format!("country '{code}' not found"))?;

    let Some(snap) = moodclock_db::get_latest_snapshot(pool, country.id).await? else {
        println!("{} ({}): no snapshots yet", country.name, country.code);
        return Ok(());
    };

    println!("{} ({})", country.name, country.code);
    println!(
        "  window   {} / {} min",
        snap.window_start.format("%Y-%m-%d %H:%M UTC"),
        snap.window_minutes
    );
    println!("  mood     {} {} {:+.3}", snap.emoji, snap.label, snap.mood_score);
    println!("  energy   {:.3}", snap.energy);
    println!("  items    {} ({})", snap.n_items, snap.confidence);

    let drivers = moodclock_db::list_drivers(pool, snap.id).await?;
    if !drivers.is_empty() {
        println!("  drivers");
        for driver in &drivers {
            println!(
                "    {:>2}. {:<32} n={:<4} avg={:+.3}",
                driver.rank, driver.topic, driver.n_items, driver.sentiment_avg
            );
        }
    }

    let samples = moodclock_db::list_samples(pool, snap.id).await?;
    if !samples.is_empty() {
        println!("  samples");
        for sample in &samples {
            println!("    [{}] {}", sample.source, sample.text);
        }
    }

    Ok(())
}
