//! Lexicon-based sentiment classification.
//!
//! A review's score is the arithmetic mean of its tokens' compound polarity
//! scores, after the negation policy is applied. The mean is bucketed into
//! five fixed, gap-free bands.

use crate::lexicon::Lexicon;
use crate::normalize::Token;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const VERY_POSITIVE_ABOVE: f64 = 0.2;
const POSITIVE_ABOVE: f64 = 0.05;
const NEGATIVE_BELOW: f64 = -0.05;
const VERY_NEGATIVE_BELOW: f64 = -0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentBucket {
    VeryPositive,
    Positive,
    Neutral,
    Negative,
    VeryNegative,
}

impl SentimentBucket {
    pub const ALL: [SentimentBucket; 5] = [
        SentimentBucket::VeryPositive,
        SentimentBucket::Positive,
        SentimentBucket::Neutral,
        SentimentBucket::Negative,
        SentimentBucket::VeryNegative,
    ];

    /// Maps a mean score onto its band.
    ///
    /// `(0.2, ∞)` very positive, `(0.05, 0.2]` positive, `[-0.05, 0.05]`
    /// neutral, `[-0.2, -0.05)` negative, `(-∞, -0.2)` very negative.
    pub fn from_score(score: f64) -> Self {
        if score > VERY_POSITIVE_ABOVE {
            SentimentBucket::VeryPositive
        } else if score > POSITIVE_ABOVE {
            SentimentBucket::Positive
        } else if score >= NEGATIVE_BELOW {
            SentimentBucket::Neutral
        } else if score >= VERY_NEGATIVE_BELOW {
            SentimentBucket::Negative
        } else {
            SentimentBucket::VeryNegative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentBucket::VeryPositive => "very_positive",
            SentimentBucket::Positive => "positive",
            SentimentBucket::Neutral => "neutral",
            SentimentBucket::Negative => "negative",
            SentimentBucket::VeryNegative => "very_negative",
        }
    }
}

impl fmt::Display for SentimentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a negation tag does to a token's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegationPolicy {
    /// Multiply the score by -1.
    #[default]
    Invert,
    /// Score negated tokens as if untagged.
    Ignore,
}

impl NegationPolicy {
    pub fn apply(&self, score: f64, negated: bool) -> f64 {
        match (self, negated) {
            (NegationPolicy::Invert, true) => -score,
            _ => score,
        }
    }
}

/// Scores and buckets filtered token sequences.
#[derive(Debug, Clone, Copy)]
pub struct SentimentClassifier<'a> {
    lexicon: &'a Lexicon,
    policy: NegationPolicy,
}

impl<'a> SentimentClassifier<'a> {
    pub fn new(lexicon: &'a Lexicon, policy: NegationPolicy) -> Self {
        Self { lexicon, policy }
    }

    /// Mean policy-adjusted compound score, or `None` for an empty review.
    pub fn score(&self, tokens: &[Token]) -> Option<f64> {
        if tokens.is_empty() {
            return None;
        }
        let total: f64 = tokens
            .iter()
            .map(|t| self.policy.apply(self.lexicon.compound(&t.text), t.negated))
            .sum();
        Some(total / tokens.len() as f64)
    }

    /// Buckets a review; empty reviews are not classified at all.
    pub fn classify(&self, tokens: &[Token]) -> Option<SentimentBucket> {
        let score = self.score(tokens)?;
        let bucket = SentimentBucket::from_score(score);
        debug!("Scored {} tokens: {:.4} -> {}", tokens.len(), score, bucket);
        Some(bucket)
    }
}
