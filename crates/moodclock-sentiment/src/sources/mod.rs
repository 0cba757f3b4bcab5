//! Content sources: where topics and posts come from.
//!
//! Every source implements [`ContentSource`]. [`Provider`] is the closed set
//! the application picks from at startup; credential fallbacks (X API to
//! scraping, Reddit OAuth to the public JSON endpoints) are resolved once
//! in [`Provider::from_config`].

mod composite;
mod mock;
mod reddit;
mod reddit_helpers;
mod scrape_helpers;
mod x_api;
mod x_scrape;

use std::future::Future;
use std::time::Duration;

use moodclock_core::{Country, ProviderMode};

use crate::error::SentimentError;
use crate::types::{ProviderConfig, TrendTopic};

pub use composite::CompositeProvider;
pub use mock::MockProvider;
pub use reddit::RedditClient;
pub use x_api::XApiClient;
pub use x_scrape::XScrapeClient;

/// A place to discover trending topics and sample posts about them.
///
/// HTTP-level failures (429, other 4xx/5xx) are logged by the source and
/// come back as an empty list. Transport failures are returned as errors;
/// callers degrade them to empty.
pub trait ContentSource: Send + Sync {
    /// Tag recorded on text samples retained from this source.
    fn sample_source(&self) -> &'static str;

    fn discover_topics(
        &self,
        country: &Country,
    ) -> impl Future<Output = Result<Vec<TrendTopic>, SentimentError>> + Send;

    fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, SentimentError>> + Send;
}

/// The X side of the pipeline: the official API when a bearer token is
/// configured, public search scraping otherwise.
pub enum XSource {
    Api(XApiClient),
    Scrape(XScrapeClient),
}

impl XSource {
    fn from_config(config: &ProviderConfig) -> Result<Self, SentimentError> {
        match config.x_bearer_token.as_deref() {
            Some(token) => Ok(Self::Api(XApiClient::new(token, config.timeout)?)),
            None => Ok(Self::Scrape(XScrapeClient::new(config.timeout)?)),
        }
    }
}

impl ContentSource for XSource {
    fn sample_source(&self) -> &'static str {
        "x"
    }

    async fn discover_topics(&self, country: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
        match self {
            Self::Api(client) => client.discover_topics(country).await,
            Self::Scrape(client) => client.discover_topics(country).await,
        }
    }

    async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        match self {
            Self::Api(client) => client.sample_content(country, topic, limit).await,
            Self::Scrape(client) => client.sample_content(country, topic, limit).await,
        }
    }
}

/// Content provider selected by `MOODCLOCK_PROVIDER`.
pub enum Provider {
    X(XSource),
    Reddit(RedditClient),
    Composite(CompositeProvider<XSource, RedditClient>),
    Mock(MockProvider),
}

impl Provider {
    /// Build the configured provider, falling back to unauthenticated
    /// variants when credentials are missing.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, SentimentError> {
        if let Some(raw) = config.unrecognized_mode.as_deref() {
            tracing::warn!(
                value = raw,
                "unrecognized MOODCLOCK_PROVIDER; falling back to mock provider"
            );
        }

        let provider = match config.mode {
            ProviderMode::X => Self::X(XSource::from_config(config)?),
            ProviderMode::Reddit => Self::Reddit(RedditClient::from_config(config)?),
            ProviderMode::Composite => Self::Composite(CompositeProvider::new(
                XSource::from_config(config)?,
                RedditClient::from_config(config)?,
                config.weight_x,
                config.weight_reddit,
            )),
            ProviderMode::Mock => Self::Mock(MockProvider::new()),
        };

        tracing::info!(
            mode = %config.mode,
            variant = provider.variant_name(),
            "content provider ready"
        );
        Ok(provider)
    }

    /// Concrete variant after credential fallback, for logs and status output.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::X(XSource::Api(_)) => "x_api",
            Self::X(XSource::Scrape(_)) => "x_scrape",
            Self::Reddit(client) => client.variant_name(),
            Self::Composite(_) => "composite",
            Self::Mock(_) => "mock",
        }
    }
}

impl ContentSource for Provider {
    fn sample_source(&self) -> &'static str {
        match self {
            Self::X(source) => source.sample_source(),
            Self::Reddit(source) => source.sample_source(),
            Self::Composite(source) => source.sample_source(),
            Self::Mock(source) => source.sample_source(),
        }
    }

    async fn discover_topics(&self, country: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
        match self {
            Self::X(source) => source.discover_topics(country).await,
            Self::Reddit(source) => source.discover_topics(country).await,
            Self::Composite(source) => source.discover_topics(country).await,
            Self::Mock(source) => source.discover_topics(country).await,
        }
    }

    async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        match self {
            Self::X(source) => source.sample_content(country, topic, limit).await,
            Self::Reddit(source) => source.sample_content(country, topic, limit).await,
            Self::Composite(source) => source.sample_content(country, topic, limit).await,
            Self::Mock(source) => source.sample_content(country, topic, limit).await,
        }
    }
}

/// Shared `reqwest` client settings for every HTTP source.
pub(crate) fn build_http_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<reqwest::Client, SentimentError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(user_agent.to_string())
        .build()?)
}

/// Normalise a base URL so paths can be appended with a leading slash.
pub(crate) fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
