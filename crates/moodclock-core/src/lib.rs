//! Shared configuration, domain types, and persistence seams for moodclock.

pub mod app_config;
pub mod config;
pub mod countries;
pub mod mood;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, ProviderMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use countries::{load_countries, parse_countries, CountriesFile, CountryConfig};
pub use mood::{
    Confidence, Country, Emotion, EmotionDistribution, MoodUpdate, NewMoodDriver,
    NewMoodSnapshot, NewTextSample, SavedSnapshot,
};
pub use store::{MoodPublisher, SnapshotStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read countries file {path}: {source}")]
    CountriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse countries file: {0}")]
    CountriesFileParse(#[from] serde_yaml::Error),

    #[error("countries validation failed: {0}")]
    Validation(String),
}
