//! Reddit source: client-credentials OAuth when configured, the public
//! `.json` endpoints otherwise.

use std::time::Duration;

use moodclock_core::Country;

use crate::error::SentimentError;
use crate::types::{ProviderConfig, TrendTopic};

use super::reddit_helpers::{country_subreddits, hot_titles, post_texts, Listing, TokenResponse};
use super::{build_http_client, trim_base_url, ContentSource};

const OAUTH_BASE_URL: &str = "https://oauth.reddit.com";
const PUBLIC_BASE_URL: &str = "https://www.reddit.com";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const HOT_LIMIT: usize = 5;
const MAX_SEARCH_RESULTS: usize = 100;

enum RedditAuth {
    OAuth {
        client_id: String,
        client_secret: String,
        token_url: String,
    },
    Public,
}

/// Credentials for one operation.
enum Session {
    Anonymous,
    Bearer(String),
}

impl Session {
    fn token(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Bearer(token) => Some(token),
        }
    }
}

pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    auth: RedditAuth,
}

impl RedditClient {
    /// OAuth when both id and secret are present, public endpoints otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, SentimentError> {
        match (
            config.reddit_client_id.as_deref(),
            config.reddit_client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) => Self::oauth(
                id,
                secret,
                &config.user_agent,
                config.timeout,
                OAUTH_BASE_URL,
                TOKEN_URL,
            ),
            _ => Self::public(&config.user_agent, config.timeout, PUBLIC_BASE_URL),
        }
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn oauth(
        client_id: &str,
        client_secret: &str,
        user_agent: &str,
        timeout: Duration,
        base_url: &str,
        token_url: &str,
    ) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout, user_agent)?,
            base_url: trim_base_url(base_url),
            auth: RedditAuth::OAuth {
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                token_url: token_url.to_string(),
            },
        })
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn public(
        user_agent: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, SentimentError> {
        Ok(Self {
            client: build_http_client(timeout, user_agent)?,
            base_url: trim_base_url(base_url),
            auth: RedditAuth::Public,
        })
    }

    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self.auth {
            RedditAuth::OAuth { .. } => "reddit_oauth",
            RedditAuth::Public => "reddit_public",
        }
    }

    fn suffix(&self) -> &'static str {
        match self.auth {
            RedditAuth::OAuth { .. } => "",
            RedditAuth::Public => ".json",
        }
    }

    /// `None` when the token exchange was refused.
    async fn session(&self, country_code: &str) -> Result<Option<Session>, SentimentError> {
        let RedditAuth::OAuth {
            client_id,
            client_secret,
            token_url,
        } = &self.auth
        else {
            return Ok(Some(Session::Anonymous));
        };

        let response = self
            .client
            .post(token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(
                country = country_code,
                source = "reddit",
                status = response.status().as_u16(),
                "Reddit token exchange failed"
            );
            return Ok(None);
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            SentimentError::source_failure("reddit", format!("token parse error: {e}"))
        })?;

        match body.access_token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(Some(Session::Bearer(token))),
            None => {
                tracing::warn!(
                    country = country_code,
                    source = "reddit",
                    "Reddit token response had no access_token"
                );
                Ok(None)
            }
        }
    }

    /// GET a listing. Error statuses are logged and yield `None`.
    async fn get_listing(
        &self,
        path: &str,
        params: &[(&str, String)],
        session: &Session,
        country_code: &str,
    ) -> Result<Option<Listing>, SentimentError> {
        let mut request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(params);
        if let Some(token) = session.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                country = country_code,
                source = "reddit",
                path,
                status = status.as_u16(),
                "Reddit request failed"
            );
            return Ok(None);
        }

        let listing: Listing = response.json().await.map_err(|e| {
            SentimentError::source_failure("reddit", format!("listing parse error: {e}"))
        })?;
        Ok(Some(listing))
    }
}

impl ContentSource for RedditClient {
    fn sample_source(&self) -> &'static str {
        "reddit"
    }

    /// Hot post titles from the country's news and general subreddits.
    async fn discover_topics(&self, country: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
        let Some(session) = self.session(&country.code).await? else {
            return Ok(Vec::new());
        };

        let mut topics = Vec::new();
        for subreddit in country_subreddits(&country.code) {
            let path = format!("/r/{subreddit}/hot{}", self.suffix());
            let params = [("limit", HOT_LIMIT.to_string())];
            match self
                .get_listing(&path, &params, &session, &country.code)
                .await
            {
                Ok(Some(listing)) => {
                    topics.extend(hot_titles(listing).into_iter().map(|t| TrendTopic::new(t, 1.0)));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        country = %country.code,
                        source = "reddit",
                        subreddit = %subreddit,
                        error = %e,
                        "subreddit fetch failed"
                    );
                }
            }
        }
        Ok(topics)
    }

    /// Hot search results for `topic`, as `title selftext`.
    async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        let Some(session) = self.session(&country.code).await? else {
            return Ok(Vec::new());
        };

        let path = format!("/search{}", self.suffix());
        let params = [
            ("q", topic.to_string()),
            ("limit", limit.min(MAX_SEARCH_RESULTS).to_string()),
            ("sort", "hot".to_string()),
        ];
        let listing = self
            .get_listing(&path, &params, &session, &country.code)
            .await?;
        Ok(listing.map(post_texts).unwrap_or_default())
    }
}
