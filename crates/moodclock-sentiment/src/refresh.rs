//! Refresh orchestration: provider → scorer → aggregator → store → publisher.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use futures::stream::{self, StreamExt};
use moodclock_core::{
    Country, EmotionDistribution, MoodPublisher, MoodUpdate, NewMoodDriver, NewMoodSnapshot,
    NewTextSample, SavedSnapshot, SnapshotStore,
};

use crate::aggregate::{
    aggregate_scores, apply_trend_coverage, average_emotions, confidence_from_samples,
    polarity_variance, select_emoji_label,
};
use crate::error::RefreshError;
use crate::scorer::score_text;
use crate::sources::ContentSource;
use crate::types::{ScoredItem, TrendTopic};

/// Posts requested per topic.
pub const SAMPLES_PER_TOPIC: usize = 20;
const MAX_DRIVERS: usize = 8;
const MAX_TEXT_SAMPLES: usize = 5;
const MAX_SAMPLE_CHARS: usize = 240;
const FALLBACK_TOPIC: &str = "general mood";

/// A snapshot that was computed, stored, and published.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub snapshot: NewMoodSnapshot,
    pub saved: SavedSnapshot,
}

/// Result of a batch refresh.
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<RefreshOutcome>,
}

/// Start of the window containing `now`.
///
/// Minutes-of-hour are floored to a multiple of `window_minutes`; windows of
/// an hour or more therefore start on the hour.
#[must_use]
pub fn window_start(now: DateTime<Utc>, window_minutes: u32) -> DateTime<Utc> {
    let window = window_minutes.max(1);
    let minute = now.minute();
    let floored = minute / window * window;
    now - TimeDelta::minutes(i64::from(minute - floored))
        - TimeDelta::seconds(i64::from(now.second()))
        - TimeDelta::nanoseconds(i64::from(now.nanosecond()))
}

struct TopicBucket {
    topic: String,
    polarities: Vec<f64>,
    emotions: Vec<EmotionDistribution>,
}

/// Compute the snapshot for one country without persisting it.
///
/// Source failures are logged and treated as empty input, so this never fails.
pub async fn build_snapshot<P: ContentSource>(
    country: &Country,
    provider: &P,
    window_minutes: u32,
    now: DateTime<Utc>,
) -> NewMoodSnapshot {
    let window_start = window_start(now, window_minutes);

    let mut topics = match provider.discover_topics(country).await {
        Ok(topics) => topics,
        Err(e) => {
            tracing::warn!(
                country = %country.code,
                source = provider.sample_source(),
                error = %e,
                "topic discovery failed"
            );
            Vec::new()
        }
    };
    if topics.is_empty() {
        topics.push(TrendTopic::new(FALLBACK_TOPIC, 1.0));
    }

    let mut scored: Vec<ScoredItem> = Vec::new();
    let mut buckets: Vec<TopicBucket> = Vec::new();
    let mut bucket_index: HashMap<String, usize> = HashMap::new();
    let mut samples: Vec<NewTextSample> = Vec::new();

    for trend in &topics {
        let posts = match provider
            .sample_content(country, &trend.topic, SAMPLES_PER_TOPIC)
            .await
        {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(
                    country = %country.code,
                    topic = %trend.topic,
                    source = provider.sample_source(),
                    error = %e,
                    "content sampling failed"
                );
                continue;
            }
        };

        for post in posts {
            let item = score_text(&post);
            scored.push(item);

            let idx = *bucket_index.entry(trend.topic.clone()).or_insert_with(|| {
                buckets.push(TopicBucket {
                    topic: trend.topic.clone(),
                    polarities: Vec::new(),
                    emotions: Vec::new(),
                });
                buckets.len() - 1
            });
            buckets[idx].polarities.push(item.polarity);
            buckets[idx].emotions.push(item.emotions);

            if samples.len() < MAX_TEXT_SAMPLES {
                samples.push(NewTextSample {
                    source: provider.sample_source().to_string(),
                    text: post.chars().take(MAX_SAMPLE_CHARS).collect(),
                });
            }
        }
    }

    let aggregated = aggregate_scores(&scored);
    let (emoji, label) = select_emoji_label(&aggregated.emotions);
    let polarities: Vec<f64> = scored.iter().map(|i| i.polarity).collect();
    let variance = polarity_variance(&polarities);
    let confidence = apply_trend_coverage(
        confidence_from_samples(scored.len(), variance),
        country.has_trends,
    );

    // Stable sort keeps discovery order among equal volumes.
    buckets.sort_by(|a, b| b.polarities.len().cmp(&a.polarities.len()));
    let drivers = buckets
        .into_iter()
        .take(MAX_DRIVERS)
        .zip(1u32..)
        .map(|(bucket, rank)| driver_from_bucket(bucket, rank))
        .collect();

    tracing::debug!(
        country = %country.code,
        topics = topics.len(),
        n_items = scored.len(),
        confidence = %confidence,
        "snapshot computed"
    );

    NewMoodSnapshot {
        country_id: country.id,
        country_code: country.code.clone(),
        window_start,
        window_minutes,
        mood_score: aggregated.mood_score,
        energy: aggregated.energy,
        emoji: emoji.to_string(),
        label: label.to_string(),
        confidence,
        n_items: count_u32(scored.len()),
        emotions: aggregated.emotions,
        drivers,
        samples,
    }
}

#[allow(clippy::cast_precision_loss)]
fn driver_from_bucket(bucket: TopicBucket, rank: u32) -> NewMoodDriver {
    let n = bucket.polarities.len();
    let sentiment_avg = bucket.polarities.iter().sum::<f64>() / n.max(1) as f64;
    NewMoodDriver {
        topic: bucket.topic,
        weight: n as f64,
        sentiment_avg,
        emotions: average_emotions(&bucket.emotions),
        n_items: count_u32(n),
        rank,
    }
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Compute, persist, and announce one country's snapshot.
///
/// The publisher is called exactly once, after the store returns.
///
/// # Errors
///
/// Returns [`RefreshError::Persistence`] when the store rejects the write;
/// nothing is published in that case.
pub async fn refresh_country<P, St, Pb>(
    country: &Country,
    provider: &P,
    store: &St,
    publisher: &Pb,
    window_minutes: u32,
    now: DateTime<Utc>,
) -> Result<RefreshOutcome, RefreshError>
where
    P: ContentSource,
    St: SnapshotStore,
    Pb: MoodPublisher + ?Sized,
{
    let snapshot = build_snapshot(country, provider, window_minutes, now).await;

    let saved = store
        .save_snapshot(&snapshot)
        .await
        .map_err(|e| RefreshError::Persistence {
            country: country.code.clone(),
            source: Box::new(e),
        })?;

    publisher.publish(&MoodUpdate::from(&snapshot));

    tracing::info!(
        country = %country.code,
        snapshot_id = saved.id,
        inserted = saved.inserted,
        window_start = %snapshot.window_start,
        n_items = snapshot.n_items,
        mood_score = snapshot.mood_score,
        "mood snapshot saved"
    );

    Ok(RefreshOutcome { snapshot, saved })
}

/// Refresh many countries with at most `max_concurrent` in flight.
///
/// A failed country is logged and counted; the rest carry on.
pub async fn refresh_all<P, St, Pb>(
    countries: &[Country],
    provider: &P,
    store: &St,
    publisher: &Pb,
    window_minutes: u32,
    now: DateTime<Utc>,
    max_concurrent: usize,
) -> RefreshSummary
where
    P: ContentSource,
    St: SnapshotStore,
    Pb: MoodPublisher + ?Sized,
{
    let futures: Vec<_> = countries
        .iter()
        .map(|country| refresh_country(country, provider, store, publisher, window_minutes, now))
        .collect();
    let results: Vec<Result<RefreshOutcome, RefreshError>> = stream::iter(futures)
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut summary = RefreshSummary::default();
    for result in results {
        match result {
            Ok(outcome) => {
                summary.succeeded += 1;
                summary.outcomes.push(outcome);
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(error = %e, "country refresh failed");
            }
        }
    }

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "batch refresh complete"
    );
    summary
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
