use std::net::SocketAddr;
use std::path::PathBuf;

/// Which content source family feeds the refresh pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    X,
    Reddit,
    Composite,
    Mock,
}

impl std::fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderMode::X => write!(f, "x"),
            ProviderMode::Reddit => write!(f, "reddit"),
            ProviderMode::Composite => write!(f, "composite"),
            ProviderMode::Mock => write!(f, "mock"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub countries_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider: ProviderMode,
    /// Raw `MOODCLOCK_PROVIDER` value when it named no known mode and
    /// `provider` fell back to [`ProviderMode::Mock`].
    pub unrecognized_provider: Option<String>,
    pub x_bearer_token: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub source_weight_x: f64,
    pub source_weight_reddit: f64,
    pub provider_timeout_secs: u64,
    pub window_minutes: u32,
    pub top_countries: Vec<String>,
    pub max_concurrent_refreshes: usize,
    pub refresh_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("countries_path", &self.countries_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("provider", &self.provider)
            .field("unrecognized_provider", &self.unrecognized_provider)
            .field(
                "x_bearer_token",
                &self.x_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_id",
                &self.reddit_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_secret",
                &self.reddit_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field("source_weight_x", &self.source_weight_x)
            .field("source_weight_reddit", &self.source_weight_reddit)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("window_minutes", &self.window_minutes)
            .field("top_countries", &self.top_countries)
            .field("max_concurrent_refreshes", &self.max_concurrent_refreshes)
            .field("refresh_cron", &self.refresh_cron)
            .finish()
    }
}
