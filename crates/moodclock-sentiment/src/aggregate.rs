//! Reduction of scored items into snapshot-level figures.

use moodclock_core::{Confidence, Emotion, EmotionDistribution};

use crate::types::{AggregatedScore, ScoredItem};

const HIGH_CONFIDENCE_MIN_ITEMS: usize = 1000;
const HIGH_CONFIDENCE_MAX_VARIANCE: f64 = 0.2;
const MED_CONFIDENCE_MIN_ITEMS: usize = 200;

/// Mean polarity (clamped), mean energy, and summed-then-normalized emotions.
///
/// An empty slice yields a zero score with a uniform emotion distribution.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_scores(items: &[ScoredItem]) -> AggregatedScore {
    if items.is_empty() {
        return AggregatedScore {
            mood_score: 0.0,
            energy: 0.0,
            emotions: EmotionDistribution::uniform(),
        };
    }

    let n = items.len() as f64;
    let mood_score = items.iter().map(|i| i.polarity).sum::<f64>() / n;
    let energy = items.iter().map(|i| i.energy).sum::<f64>() / n;

    let mut emotions = EmotionDistribution::default();
    for item in items {
        emotions.accumulate(&item.emotions);
    }

    AggregatedScore {
        mood_score: mood_score.clamp(-1.0, 1.0),
        energy,
        emotions: emotions.normalized(),
    }
}

/// Average of per-item distributions for one driver topic.
///
/// Same rules as the snapshot distribution: uniform when there are no items.
#[must_use]
pub fn average_emotions(list: &[EmotionDistribution]) -> EmotionDistribution {
    if list.is_empty() {
        return EmotionDistribution::uniform();
    }
    let mut totals = EmotionDistribution::default();
    for dist in list {
        totals.accumulate(dist);
    }
    totals.normalized()
}

/// Population variance; 0 for empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn polarity_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[must_use]
pub fn confidence_from_samples(n_items: usize, variance: f64) -> Confidence {
    if n_items >= HIGH_CONFIDENCE_MIN_ITEMS && variance < HIGH_CONFIDENCE_MAX_VARIANCE {
        Confidence::High
    } else if (MED_CONFIDENCE_MIN_ITEMS..HIGH_CONFIDENCE_MIN_ITEMS).contains(&n_items) {
        Confidence::Med
    } else {
        Confidence::Low
    }
}

/// Downgrade confidence for countries without trend coverage.
///
/// The two steps run in sequence, so an uncovered country never ends above
/// LOW: HIGH falls to MED and then on to LOW.
#[must_use]
pub fn apply_trend_coverage(confidence: Confidence, has_trends: bool) -> Confidence {
    if has_trends {
        return confidence;
    }
    let mut tier = confidence;
    if tier == Confidence::High {
        tier = Confidence::Med;
    }
    if tier == Confidence::Med {
        tier = Confidence::Low;
    }
    tier
}

/// Emoji and label for the dominant emotion.
///
/// Ties go to the earliest category in [`Emotion::ALL`].
#[must_use]
pub fn select_emoji_label(emotions: &EmotionDistribution) -> (&'static str, &'static str) {
    let mut dominant = Emotion::Joy;
    let mut best = f64::NEG_INFINITY;
    for (emotion, value) in emotions.iter() {
        if value > best {
            best = value;
            dominant = emotion;
        }
    }

    match dominant {
        Emotion::Joy => ("😀", "Joyful"),
        Emotion::Anger => ("😡", "Angry"),
        Emotion::Sadness => ("😢", "Sad"),
        Emotion::Fear => ("😨", "Tense"),
        Emotion::Neutral => ("😐", "Neutral"),
    }
}
