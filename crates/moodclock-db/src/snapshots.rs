//! Database operations for `mood_snapshots` and their `mood_drivers` /
//! `text_samples` children.

use chrono::{DateTime, Utc};
use moodclock_core::{EmotionDistribution, NewMoodSnapshot, SavedSnapshot, SnapshotStore};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::retry::retry_on_conflict;
use crate::DbError;

const UPSERT_MAX_ATTEMPTS: u32 = 3;
const UPSERT_BACKOFF_BASE_MS: u64 = 50;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A `mood_snapshots` row joined with its country code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MoodSnapshotRow {
    pub id: i64,
    pub country_id: i64,
    pub country_code: String,
    pub window_start: DateTime<Utc>,
    pub window_minutes: i32,
    pub mood_score: f64,
    pub energy: f64,
    pub emoji: String,
    pub label: String,
    pub confidence: String,
    pub n_items: i32,
    pub emotion_probs: Json<EmotionDistribution>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `mood_drivers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MoodDriverRow {
    pub id: i64,
    pub snapshot_id: i64,
    pub topic: String,
    pub weight: f64,
    pub sentiment_avg: f64,
    pub emotion_probs: Json<EmotionDistribution>,
    pub n_items: i32,
    pub rank: i32,
}

/// A row from the `text_samples` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TextSampleRow {
    pub id: i64,
    pub snapshot_id: i64,
    pub source: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

const SNAPSHOT_COLUMNS: &str = "s.id, s.country_id, c.code AS country_code, s.window_start, \
     s.window_minutes, s.mood_score, s.energy, s.emoji, s.label, s.confidence, \
     s.n_items, s.emotion_probs, s.created_at, s.updated_at";

const SNAPSHOT_FROM: &str = "FROM mood_snapshots s JOIN countries c ON c.id = s.country_id";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Postgres-backed [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SnapshotStore for PgSnapshotStore {
    type Error = DbError;

    async fn save_snapshot(&self, snapshot: &NewMoodSnapshot) -> Result<SavedSnapshot, DbError> {
        upsert_mood_snapshot(&self.pool, snapshot).await
    }
}

/// Upsert the snapshot for its (country, window) key and replace its
/// drivers and samples, all in one transaction.
///
/// Concurrent writers to the same key serialize on the row lock taken by
/// the upsert. Serialization failures, deadlocks, and unique violations
/// retry the whole transaction; anything else rolls back and propagates.
///
/// # Errors
///
/// Returns [`DbError::InvalidData`] if a count does not fit the schema, or
/// [`DbError::Sqlx`] if the transaction fails after all attempts.
pub async fn upsert_mood_snapshot(
    pool: &PgPool,
    snapshot: &NewMoodSnapshot,
) -> Result<SavedSnapshot, DbError> {
    retry_on_conflict(UPSERT_MAX_ATTEMPTS, UPSERT_BACKOFF_BASE_MS, || {
        upsert_once(pool, snapshot)
    })
    .await
}

async fn upsert_once(pool: &PgPool, snapshot: &NewMoodSnapshot) -> Result<SavedSnapshot, DbError> {
    let window_minutes = to_i32(snapshot.window_minutes, "window_minutes")?;
    let n_items = to_i32(snapshot.n_items, "n_items")?;

    let mut tx = pool.begin().await?;

    let (id, inserted): (i64, bool) = sqlx::query_as(
        "INSERT INTO mood_snapshots \
             (country_id, window_start, window_minutes, mood_score, energy, emoji, label, \
              confidence, n_items, emotion_probs) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (country_id, window_start, window_minutes) DO UPDATE SET \
             mood_score = EXCLUDED.mood_score, \
             energy = EXCLUDED.energy, \
             emoji = EXCLUDED.emoji, \
             label = EXCLUDED.label, \
             confidence = EXCLUDED.confidence, \
             n_items = EXCLUDED.n_items, \
             emotion_probs = EXCLUDED.emotion_probs, \
             updated_at = NOW() \
         RETURNING id, (xmax = 0) AS inserted",
    )
    .bind(snapshot.country_id)
    .bind(snapshot.window_start)
    .bind(window_minutes)
    .bind(snapshot.mood_score)
    .bind(snapshot.energy)
    .bind(&snapshot.emoji)
    .bind(&snapshot.label)
    .bind(snapshot.confidence.as_str())
    .bind(n_items)
    .bind(Json(snapshot.emotions))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM mood_drivers WHERE snapshot_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM text_samples WHERE snapshot_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for driver in &snapshot.drivers {
        sqlx::query(
            "INSERT INTO mood_drivers \
                 (snapshot_id, topic, weight, sentiment_avg, emotion_probs, n_items, rank) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(&driver.topic)
        .bind(driver.weight)
        .bind(driver.sentiment_avg)
        .bind(Json(driver.emotions))
        .bind(to_i32(driver.n_items, "driver n_items")?)
        .bind(to_i32(driver.rank, "driver rank")?)
        .execute(&mut *tx)
        .await?;
    }

    for sample in &snapshot.samples {
        sqlx::query("INSERT INTO text_samples (snapshot_id, source, text) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&sample.source)
            .bind(&sample.text)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(SavedSnapshot { id, inserted })
}

fn to_i32(value: u32, field: &str) -> Result<i32, DbError> {
    i32::try_from(value)
        .map_err(|_| DbError::InvalidData(format!("{field} {value} exceeds the column range")))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Most recent snapshot for a country across all window sizes, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_latest_snapshot(
    pool: &PgPool,
    country_id: i64,
) -> Result<Option<MoodSnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, MoodSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} {SNAPSHOT_FROM} \
         WHERE s.country_id = $1 \
         ORDER BY s.window_start DESC, s.updated_at DESC \
         LIMIT 1"
    ))
    .bind(country_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The snapshot stored for one exact (country, window) key, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_snapshot_for_window(
    pool: &PgPool,
    country_id: i64,
    window_start: DateTime<Utc>,
    window_minutes: u32,
) -> Result<Option<MoodSnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, MoodSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} {SNAPSHOT_FROM} \
         WHERE s.country_id = $1 AND s.window_start = $2 AND s.window_minutes = $3"
    ))
    .bind(country_id)
    .bind(window_start)
    .bind(to_i32(window_minutes, "window_minutes")?)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Latest snapshot of every country that has one, ordered by country code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_latest_per_country(pool: &PgPool) -> Result<Vec<MoodSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, MoodSnapshotRow>(&format!(
        "SELECT * FROM ( \
             SELECT DISTINCT ON (s.country_id) {SNAPSHOT_COLUMNS} {SNAPSHOT_FROM} \
             ORDER BY s.country_id, s.window_start DESC, s.updated_at DESC \
         ) latest \
         ORDER BY country_code"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Snapshots of one window size whose window started at or after `since`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_snapshots(
    pool: &PgPool,
    window_minutes: u32,
    since: DateTime<Utc>,
) -> Result<Vec<MoodSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, MoodSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} {SNAPSHOT_FROM} \
         WHERE s.window_minutes = $1 AND s.window_start >= $2 \
         ORDER BY c.code, s.window_start DESC"
    ))
    .bind(to_i32(window_minutes, "window_minutes")?)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// A country's snapshots since `since`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshot_history(
    pool: &PgPool,
    country_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<MoodSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, MoodSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} {SNAPSHOT_FROM} \
         WHERE s.country_id = $1 AND s.window_start >= $2 \
         ORDER BY s.window_start DESC, s.window_minutes"
    ))
    .bind(country_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Drivers of a snapshot ordered by rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_drivers(pool: &PgPool, snapshot_id: i64) -> Result<Vec<MoodDriverRow>, DbError> {
    let rows = sqlx::query_as::<_, MoodDriverRow>(
        "SELECT id, snapshot_id, topic, weight, sentiment_avg, emotion_probs, n_items, rank \
         FROM mood_drivers \
         WHERE snapshot_id = $1 \
         ORDER BY rank",
    )
    .bind(snapshot_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Text samples of a snapshot in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_samples(pool: &PgPool, snapshot_id: i64) -> Result<Vec<TextSampleRow>, DbError> {
    let rows = sqlx::query_as::<_, TextSampleRow>(
        "SELECT id, snapshot_id, source, text, created_at \
         FROM text_samples \
         WHERE snapshot_id = $1 \
         ORDER BY id",
    )
    .bind(snapshot_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
