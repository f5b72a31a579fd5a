//! Bucket accumulation and percentage derivation.

use crate::classify::SentimentBucket;
use crate::error::AggregationError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Per-bucket review counts. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    counts: [u64; 5],
}

fn slot(bucket: SentimentBucket) -> usize {
    match bucket {
        SentimentBucket::VeryPositive => 0,
        SentimentBucket::Positive => 1,
        SentimentBucket::Neutral => 2,
        SentimentBucket::Negative => 3,
        SentimentBucket::VeryNegative => 4,
    }
}

impl SentimentCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, bucket: SentimentBucket) {
        self.counts[slot(bucket)] += 1;
    }

    pub fn get(&self, bucket: SentimentBucket) -> u64 {
        self.counts[slot(bucket)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Positive, negative and neutral shares of the total.
    pub fn percentages(&self) -> Result<Percentages, AggregationError> {
        let total = self.total();
        if total == 0 {
            return Err(AggregationError::DivisionByZero);
        }
        let share = |n: u64| n as f64 / total as f64;
        Ok(Percentages {
            positive: share(self.get(SentimentBucket::VeryPositive) + self.get(SentimentBucket::Positive)),
            negative: share(self.get(SentimentBucket::VeryNegative) + self.get(SentimentBucket::Negative)),
            neutral: share(self.get(SentimentBucket::Neutral)),
        })
    }
}

impl AddAssign for SentimentCounts {
    fn add_assign(&mut self, other: Self) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            *mine += theirs;
        }
    }
}

impl FromIterator<SentimentBucket> for SentimentCounts {
    fn from_iter<I: IntoIterator<Item = SentimentBucket>>(iter: I) -> Self {
        let mut counts = Self::new();
        for bucket in iter {
            counts.record(bucket);
        }
        counts
    }
}

impl Serialize for SentimentCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<&'static str, u64> = SentimentBucket::ALL
            .iter()
            .map(|b| (b.as_str(), self.get(*b)))
            .collect();
        map.serialize(serializer)
    }
}

/// Fractions in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentages {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}
