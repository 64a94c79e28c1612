//! Sentiment classification for candidate answers.
//!
//! The lexicon scorer is an opaque collaborator behind `SentimentScorer`;
//! the classifier itself is just the compound-score threshold mapping.

use serde::{Deserialize, Serialize};

/// Compound-score threshold above/below which an answer counts as
/// positive/negative.
const COMPOUND_THRESHOLD: f64 = 0.05;

/// Polarity of a candidate answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        };
        write!(f, "{s}")
    }
}

/// An opaque scorer producing a compound polarity score in [-1, 1].
pub trait SentimentScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// Map a compound polarity score to a `Sentiment`.
pub fn classify_compound(compound: f64) -> Sentiment {
    if compound >= COMPOUND_THRESHOLD {
        Sentiment::Positive
    } else if compound <= -COMPOUND_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Sentiment classifier over an opaque lexicon scorer.
pub struct SentimentClassifier {
    scorer: Box<dyn SentimentScorer>,
}

impl SentimentClassifier {
    pub fn new(scorer: Box<dyn SentimentScorer>) -> Self {
        Self { scorer }
    }

    /// Classifier backed by the VADER lexicon (what production uses).
    pub fn vader() -> Self {
        Self::new(Box::new(VaderScorer::new()))
    }

    /// Classify a candidate answer.
    pub fn classify(&self, text: &str) -> Sentiment {
        classify_compound(self.scorer.compound(text))
    }
}

/// VADER-backed scorer.
pub struct VaderScorer {
    inner: vader_sentiment::SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            inner: vader_sentiment::SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        self.inner
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}
