//! Credential-free X source that scrapes public search pages through a
//! reader proxy, with a Nitter mirror as fallback.

use std::time::Duration;

use moodclock_core::Country;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::SentimentError;
use crate::types::TrendTopic;

use super::build_http_client;
use super::scrape_helpers::{extract_posts, unique_hashtags};

const DEFAULT_SEARCH_TEMPLATES: [&str; 2] = [
    "https://r.jina.ai/http://x.com/search?q={query}&f=live",
    "https://r.jina.ai/http://nitter.net/search?f=tweets&q={query}",
];

const MAX_HASHTAG_TOPICS: usize = 5;

/// Characters left unescaped in the query, matching common URL quoting.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

pub struct XScrapeClient {
    client: reqwest::Client,
    templates: Vec<String>,
}

impl XScrapeClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, SentimentError> {
        let templates = DEFAULT_SEARCH_TEMPLATES
            .iter()
            .map(|t| (*t).to_string())
            .collect();
        Self::with_templates(templates, timeout)
    }

    /// Use custom search URL templates; each must contain `{query}`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn with_templates(templates: Vec<String>, timeout: Duration) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout, "global-mood-clock")?,
            templates,
        })
    }

    /// Hashtags seen in recent posts about the country, or the country code
    /// itself when none turn up.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches the other sources.
    pub async fn discover_topics(
        &self,
        country: &Country,
    ) -> Result<Vec<TrendTopic>, SentimentError> {
        let posts = self.fetch_search(&country.code, &country.code).await;
        let tags = unique_hashtags(&posts, MAX_HASHTAG_TOPICS);
        if tags.is_empty() {
            return Ok(vec![TrendTopic::new(country.code.clone(), 1.0)]);
        }
        Ok(tags.into_iter().map(|t| TrendTopic::new(t, 1.0)).collect())
    }

    /// # Errors
    ///
    /// Never fails today; the signature matches the other sources.
    pub async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        let query = if topic.trim().is_empty() {
            country.code.as_str()
        } else {
            topic
        };
        let mut posts = self.fetch_search(query, &country.code).await;
        posts.truncate(limit);
        Ok(posts)
    }

    /// Try each template in order; the first one that yields posts wins.
    async fn fetch_search(&self, query: &str, country_code: &str) -> Vec<String> {
        let encoded = utf8_percent_encode(query, QUERY_ENCODE_SET).to_string();

        for template in &self.templates {
            let url = template.replace("{query}", &encoded);
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        country = country_code,
                        source = "x_scrape",
                        error = %e,
                        "X scrape request failed; trying next mirror"
                    );
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS {
                tracing::warn!(
                    country = country_code,
                    source = "x_scrape",
                    "X scrape unavailable (451); trying next mirror"
                );
                continue;
            }
            if !status.is_success() {
                tracing::warn!(
                    country = country_code,
                    source = "x_scrape",
                    status = status.as_u16(),
                    "X scrape request rejected; trying next mirror"
                );
                continue;
            }

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        country = country_code,
                        source = "x_scrape",
                        error = %e,
                        "X scrape body read failed"
                    );
                    continue;
                }
            };

            let posts = extract_posts(&body);
            if !posts.is_empty() {
                return posts;
            }
        }

        Vec::new()
    }
}
