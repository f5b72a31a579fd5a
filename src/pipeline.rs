//! End-to-end run: ingest pages, classify every review, aggregate, report.

use crate::aggregate::SentimentCounts;
use crate::classify::{NegationPolicy, SentimentBucket, SentimentClassifier};
use crate::config::PageMode;
use crate::error::AggregationError;
use crate::ingest::{CorpusResult, PaginatedIngestor};
use crate::lexicon::Lexicon;
use crate::normalize::prepare_review;
use crate::report::{PageBreakdown, Report};
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

/// Per-review outcomes for a corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// One entry per review body; `None` when nothing survived filtering.
    pub buckets: Vec<Option<SentimentBucket>>,
    pub counts: SentimentCounts,
    pub pages: Vec<PageBreakdown>,
}

/// Classifies every review of the corpus.
///
/// Totals come from the reviews themselves. The per-page breakdown is a view
/// over the same buckets and never feeds the totals.
pub fn analyze_corpus(corpus: &CorpusResult, lexicon: &Lexicon, policy: NegationPolicy) -> Analysis {
    let classifier = SentimentClassifier::new(lexicon, policy);

    let buckets: Vec<Option<SentimentBucket>> = corpus
        .review_bodies
        .iter()
        .enumerate()
        .map(|(idx, body)| {
            let tokens = prepare_review(body, lexicon);
            let bucket = classifier.classify(&tokens);
            if bucket.is_none() {
                debug!("Review {} has no vocabulary tokens, skipped", idx + 1);
            }
            bucket
        })
        .collect();

    let counts: SentimentCounts = buckets.iter().flatten().copied().collect();
    let pages = corpus
        .pages
        .iter()
        .map(|page| {
            let start = page.first_review.min(buckets.len());
            let end = (start + page.reviews).min(buckets.len());
            let page_counts: SentimentCounts = if page.error.is_none() {
                buckets[start..end].iter().flatten().copied().collect()
            } else {
                SentimentCounts::new()
            };
            PageBreakdown {
                page_number: page.page_number,
                titles: page.titles,
                reviews: page.reviews,
                classified: page_counts.total(),
                error: page.error.clone(),
            }
        })
        .collect();

    Analysis { buckets, counts, pages }
}

/// Everything a run needs besides the ingestor.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub product_id: String,
    pub product_name: String,
    pub mode: PageMode,
    pub negation: NegationPolicy,
}

/// Ingests, classifies and builds the report.
///
/// Per-page and per-review failures degrade to missing data. The only error
/// is an empty aggregate, which has no meaningful percentages.
pub async fn run(
    ingestor: &PaginatedIngestor,
    lexicon: Arc<Lexicon>,
    settings: &RunSettings,
) -> Result<Report, AggregationError> {
    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("run", %run_id, product = %settings.product_id);

    async move {
        let (corpus, failures) = match settings.mode {
            PageMode::Count(pages) => ingestor.ingest(&settings.product_id, pages).await,
            PageMode::FollowNext { max_pages } => {
                ingestor.ingest_following(&settings.product_id, max_pages).await
            }
        };
        info!(
            "📦 Ingested {} reviews from {} pages ({} failed)",
            corpus.review_bodies.len(),
            corpus.pages.len(),
            failures.len()
        );

        let analysis = analyze_corpus(&corpus, &lexicon, settings.negation);
        info!("🧠 Classified {} of {} reviews", analysis.counts.total(), analysis.buckets.len());

        Report::build(
            run_id,
            settings.product_name.clone(),
            analysis.counts,
            corpus.rating,
            corpus.titles,
            analysis.pages,
        )
    }
    .instrument(span)
    .await
}
