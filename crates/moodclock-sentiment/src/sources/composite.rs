//! Two-source provider: topics are merged, samples are split by weight.

use std::collections::HashSet;

use moodclock_core::Country;

use crate::error::SentimentError;
use crate::types::TrendTopic;

use super::ContentSource;

/// Merges a primary and a secondary source.
///
/// Topics are unioned by label (primary first, first occurrence wins) and
/// re-weighted by the side that surfaced them. Sample budgets are split as
/// `floor(limit * primary_weight)` for the primary and the remainder, at
/// least one, for the secondary. Either side failing degrades that side to
/// nothing.
pub struct CompositeProvider<P, S> {
    primary: P,
    secondary: S,
    primary_weight: f64,
    secondary_weight: f64,
}

impl<P: ContentSource, S: ContentSource> CompositeProvider<P, S> {
    pub fn new(primary: P, secondary: S, primary_weight: f64, secondary_weight: f64) -> Self {
        Self {
            primary,
            secondary,
            primary_weight,
            secondary_weight,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn split_limit(&self, limit: usize) -> (usize, usize) {
        let primary = ((limit as f64) * self.primary_weight).floor().max(0.0) as usize;
        let primary = primary.min(limit);
        let secondary = limit.saturating_sub(primary).max(1);
        (primary, secondary)
    }
}

impl<P: ContentSource, S: ContentSource> ContentSource for CompositeProvider<P, S> {
    fn sample_source(&self) -> &'static str {
        self.primary.sample_source()
    }

    async fn discover_topics(&self, country: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
        let primary = degrade(
            self.primary.discover_topics(country).await,
            &country.code,
            self.primary.sample_source(),
            "topic discovery failed",
        );
        let secondary = degrade(
            self.secondary.discover_topics(country).await,
            &country.code,
            self.secondary.sample_source(),
            "topic discovery failed",
        );

        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(primary.len() + secondary.len());
        for topic in primary {
            if seen.insert(topic.topic.clone()) {
                merged.push(TrendTopic::new(topic.topic, self.primary_weight));
            }
        }
        for topic in secondary {
            if seen.insert(topic.topic.clone()) {
                merged.push(TrendTopic::new(topic.topic, self.secondary_weight));
            }
        }
        Ok(merged)
    }

    async fn sample_content(
        &self,
        country: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        let (primary_limit, secondary_limit) = self.split_limit(limit);

        let mut posts = Vec::new();
        if primary_limit > 0 {
            posts.extend(degrade(
                self.primary
                    .sample_content(country, topic, primary_limit)
                    .await,
                &country.code,
                self.primary.sample_source(),
                "sampling failed",
            ));
        }
        posts.extend(degrade(
            self.secondary
                .sample_content(country, topic, secondary_limit)
                .await,
            &country.code,
            self.secondary.sample_source(),
            "sampling failed",
        ));
        Ok(posts)
    }
}

fn degrade<T>(
    result: Result<Vec<T>, SentimentError>,
    country_code: &str,
    source: &'static str,
    message: &'static str,
) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(country = country_code, source, error = %e, "{message}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        tag: &'static str,
        topics: Vec<&'static str>,
        fail: bool,
    }

    impl ContentSource for Fixed {
        fn sample_source(&self) -> &'static str {
            self.tag
        }

        async fn discover_topics(&self, _: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
            if self.fail {
                return Err(SentimentError::source_failure(self.tag, "down"));
            }
            Ok(self
                .topics
                .iter()
                .map(|t| TrendTopic::new(*t, 1.0))
                .collect())
        }

        async fn sample_content(
            &self,
            _: &Country,
            topic: &str,
            limit: usize,
        ) -> Result<Vec<String>, SentimentError> {
            if self.fail {
                return Err(SentimentError::source_failure(self.tag, "down"));
            }
            Ok((0..limit).map(|i| format!("{}:{topic}:{i}", self.tag)).collect())
        }
    }

    fn country() -> Country {
        Country {
            id: 1,
            code: "US".to_string(),
            name: "United States".to_string(),
            has_trends: true,
            woeid: None,
            centroid_lat: 39.8,
            centroid_lng: -98.5,
        }
    }

    fn fixed(tag: &'static str, topics: Vec<&'static str>) -> Fixed {
        Fixed {
            tag,
            topics,
            fail: false,
        }
    }

    #[tokio::test]
    async fn topics_merge_with_source_weights() {
        let provider = CompositeProvider::new(
            fixed("x", vec!["A", "B"]),
            fixed("reddit", vec!["B", "C"]),
            0.6,
            0.4,
        );
        let topics = provider.discover_topics(&country()).await.unwrap();
        assert_eq!(
            topics,
            vec![
                TrendTopic::new("A", 0.6),
                TrendTopic::new("B", 0.6),
                TrendTopic::new("C", 0.4),
            ]
        );
    }

    #[tokio::test]
    async fn failing_side_degrades_to_empty() {
        let provider = CompositeProvider::new(
            Fixed {
                tag: "x",
                topics: vec!["A"],
                fail: true,
            },
            fixed("reddit", vec!["C"]),
            0.6,
            0.4,
        );
        let topics = provider.discover_topics(&country()).await.unwrap();
        assert_eq!(topics, vec![TrendTopic::new("C", 0.4)]);

        let posts = provider.sample_content(&country(), "C", 20).await.unwrap();
        assert_eq!(posts.len(), 8);
        assert!(posts.iter().all(|p| p.starts_with("reddit:")));
    }

    #[tokio::test]
    async fn samples_split_by_primary_weight() {
        let provider = CompositeProvider::new(fixed("x", vec![]), fixed("reddit", vec![]), 0.6, 0.4);
        let posts = provider.sample_content(&country(), "t", 20).await.unwrap();
        let x = posts.iter().filter(|p| p.starts_with("x:")).count();
        let reddit = posts.iter().filter(|p| p.starts_with("reddit:")).count();
        assert_eq!((x, reddit), (12, 8));
        // Primary posts come first.
        assert!(posts[0].starts_with("x:"));
    }

    #[test]
    fn secondary_always_gets_at_least_one() {
        let provider = CompositeProvider::new(fixed("x", vec![]), fixed("reddit", vec![]), 1.0, 0.0);
        assert_eq!(provider.split_limit(20), (20, 1));
        assert_eq!(provider.split_limit(0), (0, 1));

        let provider = CompositeProvider::new(fixed("x", vec![]), fixed("reddit", vec![]), 0.6, 0.4);
        assert_eq!(provider.split_limit(1), (0, 1));
        assert_eq!(provider.split_limit(5), (3, 2));
    }

    #[test]
    fn sample_source_is_the_primary_tag() {
        let provider = CompositeProvider::new(fixed("x", vec![]), fixed("reddit", vec![]), 0.6, 0.4);
        assert_eq!(provider.sample_source(), "x");
    }
}
