//! Deterministic offline provider for development and tests.

use moodclock_core::Country;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

use crate::error::SentimentError;
use crate::types::TrendTopic;

use super::ContentSource;

const DEFAULT_SEED: u64 = 42;
const MOCK_TOPIC_COUNT: usize = 5;

const MOCK_TOPICS: [&str; 6] = [
    "economy outlook",
    "local sports",
    "weather alerts",
    "election buzz",
    "tech investments",
    "public health",
];

/// Same country (and topic) always yields the same topics and posts.
pub struct MockProvider {
    seed: u64,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    fn topics_for(&self, country_code: &str) -> Vec<TrendTopic> {
        let mut topics = MOCK_TOPICS;
        topics.shuffle(&mut seeded_rng(&format!("{country_code}-{}", self.seed)));
        topics
            .iter()
            .take(MOCK_TOPIC_COUNT)
            .map(|t| TrendTopic::new(*t, 1.0))
            .collect()
    }

    fn posts_for(&self, country_code: &str, topic: &str, limit: usize) -> Vec<String> {
        let mut posts = vec![
            format!("People are talking about {topic} in {country_code}."),
            format!("Mixed feelings around {topic} right now."),
            format!("News cycles keep highlighting {topic}."),
            format!("Lots of reactions to {topic} today."),
            format!("Community discussions focus on {topic} recently."),
        ];
        posts.shuffle(&mut seeded_rng(&format!(
            "{country_code}-{topic}-{}",
            self.seed
        )));
        posts.truncate(limit);
        posts
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSource for MockProvider {
    fn sample_source(&self) -> &'static str {
        "mock"
    }

    async fn discover_topics(&self, country: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
        Ok(self.topics_for(&country.code))
    }

    async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        Ok(self.posts_for(&country.code, topic, limit))
    }
}

/// RNG keyed by a string, stable across platforms and releases.
fn seeded_rng(key: &str) -> StdRng {
    let digest = Sha256::digest(key.as_bytes());
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    StdRng::from_seed(seed)
}
