use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use moodclock_core::EmotionDistribution;
use moodclock_db::{CountryRow, MoodDriverRow, TextSampleRow};
use serde::Serialize;

use crate::middleware::RequestId;

use super::snapshots::SnapshotItem;
use super::{country_not_found, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CountryItem {
    pub code: String,
    pub name: String,
    pub centroid_lat: f64,
    pub centroid_lng: f64,
    pub latest_snapshot: Option<SnapshotItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct DriverItem {
    pub topic: String,
    pub weight: f64,
    pub sentiment_avg: f64,
    pub emotion_probs: EmotionDistribution,
    pub n_items: i32,
    pub rank: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct SampleItem {
    pub source: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct CountryDetail {
    #[serde(flatten)]
    pub country: CountryItem,
    pub drivers: Vec<DriverItem>,
    pub samples: Vec<SampleItem>,
}

impl CountryItem {
    fn new(row: CountryRow, latest: Option<SnapshotItem>) -> Self {
        Self {
            code: row.code,
            name: row.name,
            centroid_lat: row.centroid_lat,
            centroid_lng: row.centroid_lng,
            latest_snapshot: latest,
        }
    }
}

impl From<MoodDriverRow> for DriverItem {
    fn from(row: MoodDriverRow) -> Self {
        Self {
            topic: row.topic,
            weight: row.weight,
            sentiment_avg: row.sentiment_avg,
            emotion_probs: row.emotion_probs.0,
            n_items: row.n_items,
            rank: row.rank,
        }
    }
}

impl From<TextSampleRow> for SampleItem {
    fn from(row: TextSampleRow) -> Self {
        Self {
            source: row.source,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_countries(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CountryItem>>>, ApiError> {
    let countries = moodclock_db::list_countries(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let latest = moodclock_db::list_latest_per_country(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut latest_by_country: HashMap<i64, SnapshotItem> = latest
        .into_iter()
        .map(|row| (row.country_id, SnapshotItem::from(row)))
        .collect();

    let data = countries
        .into_iter()
        .map(|row| {
            let snapshot = latest_by_country.remove(&row.id);
            CountryItem::new(row, snapshot)
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_country(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<CountryDetail>>, ApiError> {
    let country = moodclock_db::get_country_by_code(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| country_not_found(req_id.0.clone(), &code))?;

    let latest = moodclock_db::get_latest_snapshot(&state.pool, country.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let (drivers, samples) = match &latest {
        Some(snapshot) => {
            let drivers = moodclock_db::list_drivers(&state.pool, snapshot.id)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
            let samples = moodclock_db::list_samples(&state.pool, snapshot.id)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
            (drivers, samples)
        }
        None => (Vec::new(), Vec::new()),
    };

    let data = CountryDetail {
        country: CountryItem::new(country, latest.map(SnapshotItem::from)),
        drivers: drivers.into_iter().map(DriverItem::from).collect(),
        samples: samples.into_iter().map(SampleItem::from).collect(),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
