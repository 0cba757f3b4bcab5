use std::time::Duration;

use moodclock_core::{AppConfig, EmotionDistribution, ProviderMode};

/// Score of a single text item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    /// In `[-1.0, 1.0]`.
    pub polarity: f64,
    /// In `[0.0, 1.0]`.
    pub energy: f64,
    /// Sums to 1, or all zero when no emotion keyword matched.
    pub emotions: EmotionDistribution,
}

/// Reduction of many [`ScoredItem`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedScore {
    pub mood_score: f64,
    pub energy: f64,
    pub emotions: EmotionDistribution,
}

/// A topic label plus the weight of the source that surfaced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendTopic {
    pub topic: String,
    pub weight: f64,
}

impl TrendTopic {
    pub fn new(topic: impl Into<String>, weight: f64) -> Self {
        Self {
            topic: topic.into(),
            weight,
        }
    }
}

/// Everything [`crate::Provider::from_config`] needs to build a content provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub mode: ProviderMode,
    /// Raw mode string that fell back to mock, logged once at build time.
    pub unrecognized_mode: Option<String>,
    pub x_bearer_token: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub user_agent: String,
    pub weight_x: f64,
    pub weight_reddit: f64,
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("ProviderConfig")
            .field("mode", &self.mode)
            .field("unrecognized_mode", &self.unrecognized_mode)
            .field("x_bearer_token", &redact(&self.x_bearer_token))
            .field("reddit_client_id", &redact(&self.reddit_client_id))
            .field("reddit_client_secret", &redact(&self.reddit_client_secret))
            .field("user_agent", &self.user_agent)
            .field("weight_x", &self.weight_x)
            .field("weight_reddit", &self.weight_reddit)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            mode: config.provider,
            unrecognized_mode: config.unrecognized_provider.clone(),
            x_bearer_token: config.x_bearer_token.clone(),
            reddit_client_id: config.reddit_client_id.clone(),
            reddit_client_secret: config.reddit_client_secret.clone(),
            user_agent: config.reddit_user_agent.clone(),
            weight_x: config.source_weight_x,
            weight_reddit: config.source_weight_reddit,
            timeout: Duration::from_secs(config.provider_timeout_secs),
        }
    }

    /// A config that always resolves to the deterministic mock provider.
    #[must_use]
    pub fn mock() -> Self {
        Self {
            mode: ProviderMode::Mock,
            unrecognized_mode: None,
            x_bearer_token: None,
            reddit_client_id: None,
            reddit_client_secret: None,
            user_agent: "global-mood-clock".to_string(),
            weight_x: 0.6,
            weight_reddit: 0.4,
            timeout: Duration::from_secs(10),
        }
    }
}
