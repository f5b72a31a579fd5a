//! Review sentiment crawler.
//!
//! Fetches a product's review pages concurrently, extracts titles, bodies and
//! the star rating, runs every review through a normalization and negation
//! chain, buckets it with a lexicon polarity score and summarizes the counts.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod ingest;
pub mod lexicon;
pub mod normalize;
pub mod pipeline;
pub mod report;

pub use aggregate::{Percentages, SentimentCounts};
pub use classify::{NegationPolicy, SentimentBucket, SentimentClassifier};
pub use config::{FetchConfig, PageMode};
pub use error::{AggregationError, ConfigError, FetchError, LexiconError};
pub use extractor::{ExtractedPage, FieldExtractor};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use ingest::{merge_pages, CorpusResult, PageFailure, PageResult, PaginatedIngestor};
pub use lexicon::Lexicon;
pub use normalize::{prepare_review, tag_negation, Normalizer, Token};
pub use pipeline::{analyze_corpus, run, Analysis, RunSettings};
pub use report::{PageBreakdown, Report};
