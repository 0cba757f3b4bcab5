//! Domain types shared by the refresh pipeline, the snapshot store, and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A country as the refresh pipeline sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub has_trends: bool,
    pub woeid: Option<i64>,
    pub centroid_lat: f64,
    pub centroid_lng: f64,
}

/// The five fixed emotion categories.
///
/// Declaration order is the tie-break priority used when picking a
/// dominant emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Neutral,
    Anger,
    Sadness,
    Fear,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Joy,
        Emotion::Neutral,
        Emotion::Anger,
        Emotion::Sadness,
        Emotion::Fear,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Neutral => "neutral",
            Emotion::Anger => "anger",
            Emotion::Sadness => "sadness",
            Emotion::Fear => "fear",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability (or raw weight) per emotion category.
///
/// Serializes as a JSON object keyed by emotion name, which is also the
/// shape stored in the `emotion_probs` JSONB columns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionDistribution {
    #[serde(default)]
    pub joy: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(default)]
    pub anger: f64,
    #[serde(default)]
    pub sadness: f64,
    #[serde(default)]
    pub fear: f64,
}

impl EmotionDistribution {
    /// Every category at 0.2.
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            joy: 0.2,
            neutral: 0.2,
            anger: 0.2,
            sadness: 0.2,
            fear: 0.2,
        }
    }

    #[must_use]
    pub fn get(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Joy => self.joy,
            Emotion::Neutral => self.neutral,
            Emotion::Anger => self.anger,
            Emotion::Sadness => self.sadness,
            Emotion::Fear => self.fear,
        }
    }

    pub fn get_mut(&mut self, emotion: Emotion) -> &mut f64 {
        match emotion {
            Emotion::Joy => &mut self.joy,
            Emotion::Neutral => &mut self.neutral,
            Emotion::Anger => &mut self.anger,
            Emotion::Sadness => &mut self.sadness,
            Emotion::Fear => &mut self.fear,
        }
    }

    /// `(emotion, value)` pairs in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.into_iter().map(move |e| (e, self.get(e)))
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }

    /// Divide every category by the total; a zero total divides by 1 instead.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn normalized(&self) -> Self {
        let total = self.total();
        let denom = if total == 0.0 { 1.0 } else { total };
        let mut out = Self::default();
        for (emotion, value) in self.iter() {
            *out.get_mut(emotion) = value / denom;
        }
        out
    }

    /// Add another distribution category by category.
    pub fn accumulate(&mut self, other: &Self) {
        for (emotion, value) in other.iter() {
            *self.get_mut(emotion) += value;
        }
    }
}

/// Coarse reliability label for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Med,
    High,
}

impl Confidence {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Med => "MED",
            Confidence::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked topic to be written under a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMoodDriver {
    pub topic: String,
    pub weight: f64,
    pub sentiment_avg: f64,
    pub emotions: EmotionDistribution,
    pub n_items: u32,
    pub rank: u32,
}

/// A retained excerpt to be written under a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTextSample {
    pub source: String,
    pub text: String,
}

/// Everything one refresh produces for a (country, window) key.
///
/// The store writes the top-level fields and replaces `drivers` and
/// `samples` in a single transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMoodSnapshot {
    pub country_id: i64,
    pub country_code: String,
    pub window_start: DateTime<Utc>,
    pub window_minutes: u32,
    pub mood_score: f64,
    pub energy: f64,
    pub emoji: String,
    pub label: String,
    pub confidence: Confidence,
    pub n_items: u32,
    pub emotions: EmotionDistribution,
    pub drivers: Vec<NewMoodDriver>,
    pub samples: Vec<NewTextSample>,
}

/// Result of a successful snapshot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub id: i64,
    /// `true` when the row was created, `false` when an existing window was updated.
    pub inserted: bool,
}

/// Compact event pushed to live subscribers after a snapshot write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodUpdate {
    pub country: String,
    pub emoji: String,
    pub mood_score: f64,
    pub energy: f64,
}

impl From<&NewMoodSnapshot> for MoodUpdate {
    fn from(snapshot: &NewMoodSnapshot) -> Self {
        Self {
            country: snapshot.country_code.clone(),
            emoji: snapshot.emoji.clone(),
            mood_score: snapshot.mood_score,
            energy: snapshot.energy,
        }
    }
}
