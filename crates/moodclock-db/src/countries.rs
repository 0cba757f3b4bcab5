//! Database operations for the `countries` table.

use chrono::{DateTime, Utc};
use moodclock_core::{Country, CountryConfig};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `countries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CountryRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub has_trends: bool,
    pub woeid: Option<i64>,
    pub centroid_lat: f64,
    pub centroid_lng: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            has_trends: row.has_trends,
            woeid: row.woeid,
            centroid_lat: row.centroid_lat,
            centroid_lng: row.centroid_lng,
        }
    }
}

const COUNTRY_COLUMNS: &str =
    "id, code, name, has_trends, woeid, centroid_lat, centroid_lng, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upsert countries from the seed file, keyed by code.
///
/// All upserts run inside a single transaction. Returns the stored rows in
/// seed-file order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_countries(
    pool: &PgPool,
    countries: &[CountryConfig],
) -> Result<Vec<CountryRow>, DbError> {
    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(countries.len());

    for country in countries {
        let row = sqlx::query_as::<_, CountryRow>(&format!(
            "INSERT INTO countries (code, name, has_trends, woeid, centroid_lat, centroid_lng) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (code) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 has_trends = EXCLUDED.has_trends, \
                 woeid = EXCLUDED.woeid, \
                 centroid_lat = EXCLUDED.centroid_lat, \
                 centroid_lng = EXCLUDED.centroid_lng, \
                 updated_at = NOW() \
             RETURNING {COUNTRY_COLUMNS}"
        ))
        .bind(country.normalized_code())
        .bind(country.name.trim())
        .bind(country.has_trends)
        .bind(country.woeid)
        .bind(country.centroid_lat)
        .bind(country.centroid_lng)
        .fetch_one(&mut *tx)
        .await?;

        rows.push(row);
    }

    tx.commit().await?;
    Ok(rows)
}

/// Returns a country by its two-letter code (case-insensitive), or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_country_by_code(pool: &PgPool, code: &str) -> Result<Option<CountryRow>, DbError> {
    let row = sqlx::query_as::<_, CountryRow>(&format!(
        "SELECT {COUNTRY_COLUMNS} FROM countries WHERE code = $1"
    ))
    .bind(code.trim().to_ascii_uppercase())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns every country ordered by code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_countries(pool: &PgPool) -> Result<Vec<CountryRow>, DbError> {
    let rows = sqlx::query_as::<_, CountryRow>(&format!(
        "SELECT {COUNTRY_COLUMNS} FROM countries ORDER BY code"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the countries whose codes appear in `codes`, in the order given.
///
/// Codes with no matching row are silently skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_countries_by_codes(
    pool: &PgPool,
    codes: &[String],
) -> Result<Vec<CountryRow>, DbError> {
    let codes: Vec<String> = codes
        .iter()
        .map(|c| c.trim().to_ascii_uppercase())
        .collect();

    let rows = sqlx::query_as::<_, CountryRow>(&format!(
        "SELECT {COUNTRY_COLUMNS} FROM countries \
         WHERE code::text = ANY($1) \
         ORDER BY array_position($1, code::text)"
    ))
    .bind(&codes)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
