//! X (Twitter) v2 API source, bearer-token authenticated.

use std::time::Duration;

use moodclock_core::Country;
use serde::Deserialize;

use crate::error::SentimentError;
use crate::types::TrendTopic;

use super::{build_http_client, trim_base_url};

const DEFAULT_BASE_URL: &str = "https://api.x.com";
const TREND_SEARCH_RESULTS: usize = 10;
const MAX_SEARCH_RESULTS: usize = 100;

#[derive(Debug, Deserialize)]
struct TrendsResponse {
    #[serde(default)]
    data: Vec<Trend>,
}

#[derive(Debug, Deserialize)]
struct Trend {
    #[serde(alias = "trend_name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    text: Option<String>,
}

/// Client for the X v2 REST API.
pub struct XApiClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl XApiClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(bearer_token: &str, timeout: Duration) -> Result<Self, SentimentError> {
        Self::with_base_url(bearer_token, timeout, DEFAULT_BASE_URL)
    }

    /// Point the client at another host (wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        bearer_token: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout, "global-mood-clock")?,
            base_url: trim_base_url(base_url),
            bearer_token: bearer_token.to_string(),
        })
    }

    /// Trending topics for the country's WOEID, or recent posts mentioning
    /// the country code when no WOEID is known.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] on transport or decode failure.
    pub async fn discover_topics(
        &self,
        country: &Country,
    ) -> Result<Vec<TrendTopic>, SentimentError> {
        if let Some(woeid) = country.woeid {
            let url = format!("{}/2/trends/by/woeid/{woeid}", self.base_url);
            let Some(response) = self.get(&url, &[], &country.code, "trends").await? else {
                return Ok(Vec::new());
            };
            let body: TrendsResponse = response.json().await.map_err(|e| {
                SentimentError::source_failure("x_api", format!("trends parse error: {e}"))
            })?;
            return Ok(body
                .data
                .into_iter()
                .filter_map(|t| t.name.filter(|n| !n.trim().is_empty()))
                .map(|name| TrendTopic::new(name, 1.0))
                .collect());
        }

        let params = [
            ("query", country.code.clone()),
            ("max_results", TREND_SEARCH_RESULTS.to_string()),
        ];
        let texts = self.search(&params, &country.code).await?;
        Ok(texts
            .into_iter()
            .map(|text| TrendTopic::new(text, 1.0))
            .collect())
    }

    /// Recent English posts about `topic`, retweets excluded.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] on transport or decode failure.
    pub async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        let params = [
            ("query", format!("{topic} lang:en -is:retweet")),
            ("max_results", limit.min(MAX_SEARCH_RESULTS).to_string()),
        ];
        self.search(&params, &country.code).await
    }

    async fn search(
        &self,
        params: &[(&str, String)],
        country_code: &str,
    ) -> Result<Vec<String>, SentimentError> {
        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let Some(response) = self.get(&url, params, country_code, "search").await? else {
            return Ok(Vec::new());
        };
        let body: SearchResponse = response.json().await.map_err(|e| {
            SentimentError::source_failure("x_api", format!("search parse error: {e}"))
        })?;
        Ok(body
            .data
            .into_iter()
            .filter_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// Send an authenticated GET. Error statuses are logged and yield `None`.
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        country_code: &str,
        endpoint: &'static str,
    ) -> Result<Option<reqwest::Response>, SentimentError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(
                country = country_code,
                source = "x_api",
                endpoint,
                "X rate limit hit"
            );
            return Ok(None);
        }
        if !status.is_success() {
            tracing::warn!(
                country = country_code,
                source = "x_api",
                endpoint,
                status = status.as_u16(),
                "X request failed"
            );
            return Ok(None);
        }
        Ok(Some(response))
    }
}
