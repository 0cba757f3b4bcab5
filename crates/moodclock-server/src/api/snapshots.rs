use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, TimeDelta, Utc};
use moodclock_core::EmotionDistribution;
use moodclock_db::MoodSnapshotRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{country_not_found, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_LATEST_MINUTES: u32 = 15;
const DEFAULT_HISTORY_HOURS: u32 = 24;

#[derive(Debug, Serialize)]
pub(super) struct SnapshotItem {
    pub country: String,
    pub window_start: DateTime<Utc>,
    pub window_minutes: i32,
    pub mood_score: f64,
    pub energy: f64,
    pub emoji: String,
    pub label: String,
    pub confidence: String,
    pub n_items: i32,
    pub emotion_probs: EmotionDistribution,
}

impl From<MoodSnapshotRow> for SnapshotItem {
    fn from(row: MoodSnapshotRow) -> Self {
        Self {
            country: row.country_code,
            window_start: row.window_start,
            window_minutes: row.window_minutes,
            mood_score: row.mood_score,
            energy: row.energy,
            emoji: row.emoji,
            label: row.label,
            confidence: row.confidence,
            n_items: row.n_items,
            emotion_probs: row.emotion_probs.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LatestSnapshotsQuery {
    pub minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SnapshotHistoryQuery {
    pub hours: Option<u32>,
}

/// Snapshots of a given window size whose window started within the last
/// `minutes` minutes. The look-back doubles as the window size filter.
pub(super) async fn list_latest_snapshots(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<LatestSnapshotsQuery>,
) -> Result<Json<ApiResponse<Vec<SnapshotItem>>>, ApiError> {
    let minutes = query.minutes.unwrap_or(DEFAULT_LATEST_MINUTES);
    if minutes == 0 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "minutes must be greater than zero",
        ));
    }

    let cutoff = Utc::now() - TimeDelta::minutes(i64::from(minutes));
    let rows = moodclock_db::list_recent_snapshots(&state.pool, minutes, cutoff)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SnapshotItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_snapshot_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
    Query(query): Query<SnapshotHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<SnapshotItem>>>, ApiError> {
    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    let Some(since) = TimeDelta::try_hours(i64::from(hours))
        .and_then(|lookback| Utc::now().checked_sub_signed(lookback))
    else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("hours {hours} reaches past the supported date range"),
        ));
    };

    let country = moodclock_db::get_country_by_code(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| country_not_found(req_id.0.clone(), &code))?;

    let rows = moodclock_db::list_snapshot_history(&state.pool, country.id, since)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SnapshotItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
