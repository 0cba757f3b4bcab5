//! Offline unit tests for moodclock-db pool configuration and row types.
//! These tests do not require a live database connection.

use moodclock_core::{AppConfig, EmotionDistribution, ProviderMode};
use moodclock_db::{MoodSnapshotRow, PoolConfig};
use sqlx::types::Json;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000),
        log_level: "info".to_string(),
        countries_path: PathBuf::from("./config/countries.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        provider: ProviderMode::Mock,
        unrecognized_provider: None,
        x_bearer_token: None,
        reddit_client_id: None,
        reddit_client_secret: None,
        reddit_user_agent: "ua".to_string(),
        source_weight_x: 0.6,
        source_weight_reddit: 0.4,
        provider_timeout_secs: 10,
        window_minutes: 15,
        top_countries: vec!["US".to_string()],
        max_concurrent_refreshes: 4,
        refresh_cron: "0 */15 * * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`MoodSnapshotRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn mood_snapshot_row_has_expected_fields() {
    use chrono::Utc;

    let now = Utc::now();
    let row = MoodSnapshotRow {
        id: 1_i64,
        country_id: 2_i64,
        country_code: "US".to_string(),
        window_start: now,
        window_minutes: 15_i32,
        mood_score: 0.25,
        energy: 0.5,
        emoji: "😊".to_string(),
        label: "Happy".to_string(),
        confidence: "MED".to_string(),
        n_items: 30_i32,
        emotion_probs: Json(EmotionDistribution::uniform()),
        created_at: now,
        updated_at: now,
    };

    assert_eq!(row.country_code, "US");
    assert_eq!(row.window_minutes, 15);
    assert_eq!(row.confidence, "MED");
    assert!((row.emotion_probs.0.total() - 1.0).abs() < 1e-9);
}
