//! Mood pipeline for moodclock.
//!
//! Discovers trending topics per country, samples public posts from X and
//! Reddit (or a deterministic mock), scores each post with a small lexicon,
//! and reduces everything into one windowed snapshot that is handed to a
//! [`moodclock_core::SnapshotStore`] and announced via a
//! [`moodclock_core::MoodPublisher`].

pub mod aggregate;
pub mod error;
pub mod refresh;
pub mod scorer;
pub mod sources;
pub mod types;

pub use aggregate::{
    aggregate_scores, apply_trend_coverage, average_emotions, confidence_from_samples,
    polarity_variance, select_emoji_label,
};
pub use error::{RefreshError, SentimentError};
pub use refresh::{
    build_snapshot, refresh_all, refresh_country, window_start, RefreshOutcome, RefreshSummary,
    SAMPLES_PER_TOPIC,
};
pub use scorer::score_text;
pub use sources::{
    CompositeProvider, ContentSource, MockProvider, Provider, RedditClient, XApiClient,
    XScrapeClient, XSource,
};
pub use types::{AggregatedScore, ProviderConfig, ScoredItem, TrendTopic};
