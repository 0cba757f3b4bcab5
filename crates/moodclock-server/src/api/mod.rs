mod countries;
mod snapshots;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::broadcast::{mood_socket, MoodBroadcaster};
use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub broadcaster: MoodBroadcaster,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &moodclock_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn country_not_found(request_id: String, code: &str) -> ApiError {
    ApiError::new(
        request_id,
        "not_found",
        format!("country '{}' not found", code.trim().to_ascii_uppercase()),
    )
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/countries", get(countries::list_countries))
        .route("/api/v1/countries/{code}", get(countries::get_country))
        .route(
            "/api/v1/snapshots/latest",
            get(snapshots::list_latest_snapshots),
        )
        .route(
            "/api/v1/snapshots/{code}/history",
            get(snapshots::list_snapshot_history),
        )
        .route("/ws/moods", get(mood_socket))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match moodclock_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::BROADCAST_CAPACITY;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use moodclock_core::{Country, CountryConfig, MoodPublisher, MoodUpdate};
    use moodclock_db::PgSnapshotStore;
    use moodclock_sentiment::{refresh_country, MockProvider};
    use tower::ServiceExt;

    struct Silent;

    impl MoodPublisher for Silent {
        fn publish(&self, _update: &MoodUpdate) {}
    }

    fn app(pool: PgPool) -> Router {
        build_app(AppState {
            pool,
            broadcaster: MoodBroadcaster::new(BROADCAST_CAPACITY),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    /// Seed US and KE, then run one mock refresh for US in the current window.
    async fn seed_with_snapshot(pool: &PgPool) {
        let configs = vec![
            CountryConfig {
                code: "US".to_string(),
                name: "United States".to_string(),
                has_trends: true,
                woeid: Some(23_424_977),
                centroid_lat: 39.83,
                centroid_lng: -98.58,
            },
            CountryConfig {
                code: "KE".to_string(),
                name: "Kenya".to_string(),
                has_trends: true,
                woeid: Some(23_424_863),
                centroid_lat: -0.02,
                centroid_lng: 37.91,
            },
        ];
        let rows = moodclock_db::seed_countries(pool, &configs)
            .await
            .expect("seed countries");
        let us = Country::from(rows[0].clone());

        refresh_country(
            &us,
            &MockProvider::new(),
            &PgSnapshotStore::new(pool.clone()),
            &Silent,
            15,
            Utc::now(),
        )
        .await
        .expect("refresh US");
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_unknown_code_maps_to_500() {
        let response = ApiError::new("req-1", "internal_error", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok_with_live_database(pool: PgPool) {
        let (status, json) = get_json(app(pool), "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn countries_include_latest_snapshot_when_present(pool: PgPool) {
        seed_with_snapshot(&pool).await;

        let (status, json) = get_json(app(pool), "/api/v1/countries").await;

        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 2);
        let ke = data.iter().find(|c| c["code"] == "KE").expect("KE row");
        assert!(ke["latest_snapshot"].is_null());
        let us = data.iter().find(|c| c["code"] == "US").expect("US row");
        assert_eq!(us["latest_snapshot"]["window_minutes"], 15);
        assert!(us["latest_snapshot"]["emotion_probs"]["joy"].is_number());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn country_detail_lists_drivers_and_samples(pool: PgPool) {
        seed_with_snapshot(&pool).await;

        let (status, json) = get_json(app(pool), "/api/v1/countries/us").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["code"], "US");
        let drivers = json["data"]["drivers"].as_array().expect("drivers");
        assert!(!drivers.is_empty() && drivers.len() <= 8);
        assert_eq!(drivers[0]["rank"], 1);
        let samples = json["data"]["samples"].as_array().expect("samples");
        assert!(samples.len() <= 5);
        assert!(samples.iter().all(|s| s["source"] == "mock"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn country_detail_returns_404_for_unknown_code(pool: PgPool) {
        let (status, json) = get_json(app(pool), "/api/v1/countries/zz").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn latest_snapshots_filter_by_window_size(pool: PgPool) {
        seed_with_snapshot(&pool).await;

        let (status, json) = get_json(app(pool.clone()), "/api/v1/snapshots/latest").await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["country"], "US");

        let (_, json) = get_json(app(pool), "/api/v1/snapshots/latest?minutes=60").await;
        assert!(json["data"].as_array().expect("data array").is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn latest_snapshots_rejects_zero_minutes(pool: PgPool) {
        let (status, json) = get_json(app(pool), "/api/v1/snapshots/latest?minutes=0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn history_returns_snapshots_for_known_country(pool: PgPool) {
        seed_with_snapshot(&pool).await;

        let (status, json) = get_json(app(pool.clone()), "/api/v1/snapshots/US/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().expect("data array").len(), 1);

        let (status, _) = get_json(app(pool), "/api/v1/snapshots/ZZ/history?hours=1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn history_rejects_lookback_beyond_date_range(pool: PgPool) {
        seed_with_snapshot(&pool).await;

        let (status, json) =
            get_json(app(pool), "/api/v1/snapshots/US/history?hours=4294967295").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }
}
