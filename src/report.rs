//! The end-of-run summary and its text rendering.

use crate::aggregate::{Percentages, SentimentCounts};
use crate::classify::SentimentBucket;
use crate::error::AggregationError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// What one page contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBreakdown {
    pub page_number: u32,
    pub titles: usize,
    pub reviews: usize,
    pub classified: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: uuid::Uuid,
    pub product: String,
    pub generated_at: DateTime<Utc>,
    pub counts: SentimentCounts,
    pub total: u64,
    pub percentages: Percentages,
    pub rating: Option<String>,
    pub titles: BTreeMap<usize, String>,
    pub pages: Vec<PageBreakdown>,
}

impl Report {
    /// Finalizes the counts. Fails when no review was classified.
    pub fn build(
        run_id: uuid::Uuid,
        product: impl Into<String>,
        counts: SentimentCounts,
        rating: Option<String>,
        titles: BTreeMap<usize, String>,
        pages: Vec<PageBreakdown>,
    ) -> Result<Self, AggregationError> {
        let percentages = counts.percentages()?;
        Ok(Self {
            run_id,
            product: product.into(),
            generated_at: Utc::now(),
            total: counts.total(),
            counts,
            percentages,
            rating,
            titles,
            pages,
        })
    }
}

fn pct(fraction: f64) -> String {
    format!("{:.4}%", fraction * 100.0)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SENTIMENT ANALYSIS OF {} REVIEWS", self.product.to_uppercase())?;

        for page in &self.pages {
            writeln!(f)?;
            match &page.error {
                Some(reason) => writeln!(f, "Page {}: failed ({})", page.page_number, reason)?,
                None => writeln!(
                    f,
                    "Page {}: {} titles, {} reviews, {} classified",
                    page.page_number, page.titles, page.reviews, page.classified
                )?,
            }
        }

        if !self.titles.is_empty() {
            writeln!(f, "\nTITLES:")?;
            for (idx, title) in &self.titles {
                writeln!(f, "  {idx}. {title}")?;
            }
        }

        writeln!(f, "\nTotal Reviews = {}", self.total)?;
        writeln!(
            f,
            "Total Very Positive Reviews = {}\tTotal Positive Reviews = {}",
            self.counts.get(SentimentBucket::VeryPositive),
            self.counts.get(SentimentBucket::Positive)
        )?;
        writeln!(
            f,
            "Total Very Negative Reviews = {}\tTotal Negative Reviews = {}",
            self.counts.get(SentimentBucket::VeryNegative),
            self.counts.get(SentimentBucket::Negative)
        )?;
        writeln!(f, "Total Neutral Reviews = {}", self.counts.get(SentimentBucket::Neutral))?;

        writeln!(f, "\nOverall Positive Reviews: {}", pct(self.percentages.positive))?;
        writeln!(f, "Overall Negative Reviews: {}", pct(self.percentages.negative))?;
        writeln!(f, "Overall Neutral Reviews: {}", pct(self.percentages.neutral))?;

        match &self.rating {
            Some(rating) => write!(f, "\nCompare to the product's star rating of {rating}"),
            None => write!(f, "\nNo star rating was found to compare against"),
        }
    }
}
