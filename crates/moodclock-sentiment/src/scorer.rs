//! Lexicon scorer for short social posts.
//!
//! Deliberately tiny: two polarity word lists, a punctuation/caps energy
//! heuristic, and keyword counts for the five emotion categories.

use std::sync::LazyLock;

use moodclock_core::{Emotion, EmotionDistribution};
use regex::Regex;

use crate::types::ScoredItem;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "love", "happy", "joy", "win", "relief", "hope", "peace",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "sad", "angry", "fear", "loss", "hate", "crisis", "panic", "pain",
];

const EMOTION_KEYWORDS: &[(Emotion, &[&str])] = &[
    (Emotion::Joy, &["happy", "joy", "delight", "celebrate", "win"]),
    (
        Emotion::Neutral,
        &["update", "report", "statement", "analysis", "news"],
    ),
    (Emotion::Anger, &["angry", "furious", "rage", "protest"]),
    (Emotion::Sadness, &["sad", "loss", "grief", "mourning"]),
    (Emotion::Fear, &["fear", "panic", "worry", "alert"]),
];

/// Glyphs that count toward energy, one point each.
const MOOD_GLYPHS: &[char] = &['😀', '😐', '😡', '😢', '😨'];

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z']+").expect("valid token regex"));

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Score one text item. Pure and deterministic.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_text(text: &str) -> ScoredItem {
    let tokens = tokenize(text);
    let count_in = |words: &[&str]| {
        tokens
            .iter()
            .filter(|t| words.contains(&t.as_str()))
            .count()
    };

    let pos = count_in(POSITIVE_WORDS) as f64;
    let neg = count_in(NEGATIVE_WORDS) as f64;
    let polarity = ((pos - neg) / (pos + neg).max(1.0)).clamp(-1.0, 1.0);

    let exclamations = text.matches('!').count() as f64;
    let questions = text.matches('?').count() as f64;
    let caps = text.chars().filter(|c| c.is_uppercase()).count() as f64;
    let glyphs = text.chars().filter(|c| MOOD_GLYPHS.contains(c)).count() as f64;
    let energy = ((exclamations + questions + caps / 10.0 + glyphs) / 5.0).clamp(0.0, 1.0);

    let mut hits = EmotionDistribution::default();
    for (emotion, keywords) in EMOTION_KEYWORDS {
        *hits.get_mut(*emotion) = count_in(keywords) as f64;
    }

    ScoredItem {
        polarity,
        energy,
        emotions: hits.normalized(),
    }
}
