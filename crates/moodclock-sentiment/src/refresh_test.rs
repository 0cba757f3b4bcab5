use std::sync::Mutex;

use chrono::TimeZone;
use moodclock_core::Confidence;

use super::*;
use crate::error::SentimentError;
use crate::sources::MockProvider;

#[derive(Debug, thiserror::Error)]
#[error("store unavailable")]
struct StoreDown;

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Vec<NewMoodSnapshot>>,
    fail: bool,
}

impl SnapshotStore for MemoryStore {
    type Error = StoreDown;

    async fn save_snapshot(&self, snapshot: &NewMoodSnapshot) -> Result<SavedSnapshot, StoreDown> {
        if self.fail {
            return Err(StoreDown);
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(snapshot.clone());
        Ok(SavedSnapshot {
            id: i64::try_from(saved.len()).unwrap(),
            inserted: true,
        })
    }
}

#[derive(Default)]
struct RecordingPublisher {
    updates: Mutex<Vec<MoodUpdate>>,
}

impl MoodPublisher for RecordingPublisher {
    fn publish(&self, update: &MoodUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}

/// Source that replays fixed topics and per-topic posts.
struct Scripted {
    topics: Result<Vec<TrendTopic>, ()>,
    posts: Vec<(&'static str, Vec<String>)>,
    failing_topic: Option<&'static str>,
}

impl ContentSource for Scripted {
    fn sample_source(&self) -> &'static str {
        "reddit"
    }

    async fn discover_topics(&self, _: &Country) -> Result<Vec<TrendTopic>, SentimentError> {
        self.topics
            .clone()
            .map_err(|()| SentimentError::source_failure("scripted", "no topics"))
    }

    async fn sample_content(
        &self,
        _: &Country,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, SentimentError> {
        if self.failing_topic == Some(topic) {
            return Err(SentimentError::source_failure("scripted", "boom"));
        }
        Ok(self
            .posts
            .iter()
            .find(|(t, _)| *t == topic)
            .map(|(_, p)| p.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

fn country(code: &str, has_trends: bool) -> Country {
    Country {
        id: 7,
        code: code.to_string(),
        name: format!("Country {code}"),
        has_trends,
        woeid: None,
        centroid_lat: 0.0,
        centroid_lng: 0.0,
    }
}

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap() + TimeDelta::milliseconds(123)
}

fn posts(n: usize, text: &str) -> Vec<String> {
    (0..n).map(|i| format!("{text} {i}")).collect()
}

#[test]
fn window_start_floors_to_window() {
    assert_eq!(window_start(at(10, 37, 42), 15), at(10, 30, 0) - TimeDelta::milliseconds(123));
    assert_eq!(window_start(at(10, 14, 59), 15), at(10, 0, 0) - TimeDelta::milliseconds(123));
    assert_eq!(window_start(at(10, 59, 1), 1), at(10, 59, 0) - TimeDelta::milliseconds(123));
}

#[test]
fn hour_or_longer_windows_start_on_the_hour() {
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    assert_eq!(window_start(at(10, 37, 42), 60), expected);
    assert_eq!(window_start(at(10, 37, 42), 120), expected);
}

#[tokio::test]
async fn empty_discovery_uses_general_mood_topic() {
    let source = Scripted {
        topics: Ok(vec![]),
        posts: vec![("general mood", posts(3, "calm day"))],
        failing_topic: None,
    };
    let snap = build_snapshot(&country("FR", true), &source, 15, at(9, 5, 0)).await;
    assert_eq!(snap.n_items, 3);
    assert_eq!(snap.drivers.len(), 1);
    assert_eq!(snap.drivers[0].topic, "general mood");
}

#[tokio::test]
async fn discovery_error_degrades_to_general_mood() {
    let source = Scripted {
        topics: Err(()),
        posts: vec![],
        failing_topic: None,
    };
    let snap = build_snapshot(&country("FR", true), &source, 15, at(9, 5, 0)).await;
    assert_eq!(snap.n_items, 0);
    assert!(snap.mood_score.abs() < f64::EPSILON);
    assert_eq!(snap.emotions, EmotionDistribution::uniform());
    assert_eq!(snap.emoji, "😀");
    assert_eq!(snap.confidence, Confidence::Low);
    assert!(snap.drivers.is_empty());
    assert!(snap.samples.is_empty());
}

#[tokio::test]
async fn drivers_rank_by_volume_with_discovery_tie_break() {
    let source = Scripted {
        topics: Ok(vec![
            TrendTopic::new("small", 1.0),
            TrendTopic::new("tie-a", 1.0),
            TrendTopic::new("big", 1.0),
            TrendTopic::new("tie-b", 1.0),
            TrendTopic::new("broken", 1.0),
        ]),
        posts: vec![
            ("small", posts(1, "good")),
            ("tie-a", posts(3, "bad")),
            ("big", posts(6, "happy")),
            ("tie-b", posts(3, "news")),
        ],
        failing_topic: Some("broken"),
    };
    let snap = build_snapshot(&country("DE", true), &source, 15, at(9, 5, 0)).await;

    let order: Vec<(&str, u32, u32)> = snap
        .drivers
        .iter()
        .map(|d| (d.topic.as_str(), d.n_items, d.rank))
        .collect();
    assert_eq!(
        order,
        vec![("big", 6, 1), ("tie-a", 3, 2), ("tie-b", 3, 3), ("small", 1, 4)]
    );
    assert!((snap.drivers[0].weight - 6.0).abs() < f64::EPSILON);
    assert!((snap.drivers[1].sentiment_avg + 1.0).abs() < 1e-9);
    assert_eq!(snap.n_items, 13);
}

#[tokio::test]
async fn at_most_eight_drivers() {
    let labels = ["t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9"];
    let source = Scripted {
        topics: Ok(labels.iter().map(|l| TrendTopic::new(*l, 1.0)).collect()),
        posts: labels.iter().map(|l| (*l, posts(1, "x"))).collect(),
        failing_topic: None,
    };
    let snap = build_snapshot(&country("DE", true), &source, 15, at(9, 5, 0)).await;
    assert_eq!(snap.drivers.len(), 8);
    assert_eq!(snap.drivers[7].topic, "t7");
}

#[tokio::test]
async fn samples_keep_first_five_truncated() {
    let long = "é".repeat(300);
    let mut texts = vec![long];
    texts.extend(posts(6, "short"));
    let source = Scripted {
        topics: Ok(vec![TrendTopic::new("one", 1.0)]),
        posts: vec![("one", texts)],
        failing_topic: None,
    };
    let snap = build_snapshot(&country("DE", true), &source, 15, at(9, 5, 0)).await;
    assert_eq!(snap.samples.len(), 5);
    assert_eq!(snap.samples[0].text.chars().count(), 240);
    assert_eq!(snap.samples[1].text, "short 0");
    assert!(snap.samples.iter().all(|s| s.source == "reddit"));
}

#[tokio::test]
async fn refresh_saves_then_publishes_once() {
    let store = MemoryStore::default();
    let publisher = RecordingPublisher::default();
    let us = country("US", true);

    let outcome = refresh_country(&us, &MockProvider::new(), &store, &publisher, 15, at(12, 44, 0))
        .await
        .expect("refresh succeeds");

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].window_start, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    assert_eq!(saved[0].window_minutes, 15);
    assert!(saved[0].n_items > 0);
    assert!(saved[0].drivers.len() <= 8);
    assert!(saved[0]
        .drivers
        .windows(2)
        .all(|w| w[0].n_items >= w[1].n_items));
    assert!(saved[0].samples.iter().all(|s| s.source == "mock"));

    let updates = publisher.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].country, "US");
    assert_eq!(updates[0].emoji, outcome.snapshot.emoji);
    assert!((updates[0].mood_score - outcome.snapshot.mood_score).abs() < f64::EPSILON);
}

#[tokio::test]
async fn failed_save_publishes_nothing() {
    let store = MemoryStore {
        fail: true,
        ..MemoryStore::default()
    };
    let publisher = RecordingPublisher::default();

    let err = refresh_country(
        &country("US", true),
        &MockProvider::new(),
        &store,
        &publisher,
        15,
        at(12, 44, 0),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RefreshError::Persistence { ref country, .. } if country == "US"));
    assert!(publisher.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn same_inputs_build_identical_snapshots() {
    let provider = MockProvider::new();
    let a = build_snapshot(&country("JP", false), &provider, 15, at(8, 1, 0)).await;
    let b = build_snapshot(&country("JP", false), &provider, 15, at(8, 14, 0)).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn refresh_all_counts_each_country() {
    let store = MemoryStore::default();
    let publisher = RecordingPublisher::default();
    let countries = vec![country("US", true), country("GB", true), country("KE", false)];

    let summary = refresh_all(
        &countries,
        &MockProvider::new(),
        &store,
        &publisher,
        15,
        at(6, 0, 0),
        2,
    )
    .await;

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.outcomes.len(), 3);
    assert_eq!(publisher.updates.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn refresh_all_reports_failures_without_aborting() {
    let store = MemoryStore {
        fail: true,
        ..MemoryStore::default()
    };
    let publisher = RecordingPublisher::default();
    let countries = vec![country("US", true), country("GB", true)];

    let summary = refresh_all(
        &countries,
        &MockProvider::new(),
        &store,
        &publisher,
        15,
        at(6, 0, 0),
        4,
    )
    .await;

    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 2);
    assert!(summary.outcomes.is_empty());
}
