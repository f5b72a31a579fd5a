//! Paginated ingestion: fetch every page, extract its fields, and merge the
//! per-page results into one corpus.
//!
//! Pages complete in whatever order the network allows. [`merge_pages`]
//! sorts by page number before assigning global indices, so the corpus is a
//! pure function of the page contents and never of scheduling.

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::extractor::FieldExtractor;
use crate::fetcher::PageFetcher;
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of fetching and extracting one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub page_number: u32,
    pub titles: BTreeMap<usize, String>,
    pub review_bodies: Vec<String>,
    pub rating: Option<String>,
    pub error: Option<FetchError>,
}

impl PageResult {
    pub fn failed(page_number: u32, error: FetchError) -> Self {
        Self {
            page_number,
            titles: BTreeMap::new(),
            review_bodies: Vec::new(),
            rating: None,
            error: Some(error),
        }
    }
}

/// A page that contributed nothing because its fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    pub page_number: u32,
    pub reason: String,
}

/// Per-page shape kept for the report.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub page_number: u32,
    pub titles: usize,
    pub reviews: usize,
    /// Global index of this page's first review body.
    pub first_review: usize,
    pub error: Option<String>,
}

/// All pages merged into one ordered corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusResult {
    /// Global 1-based index (encounter order across sorted pages) → title.
    pub titles: BTreeMap<usize, String>,
    pub review_bodies: Vec<String>,
    pub rating: Option<String>,
    pub pages: Vec<PageSummary>,
}

/// Merges page results into a corpus.
///
/// Pages are sorted by number first; titles are renumbered globally in
/// encounter order (page-ascending, then local-index-ascending). The rating
/// comes from page 1 only.
pub fn merge_pages(mut pages: Vec<PageResult>) -> (CorpusResult, Vec<PageFailure>) {
    pages.sort_by_key(|p| p.page_number);

    let mut corpus = CorpusResult::default();
    let mut failures = Vec::new();
    let mut next_title = 1;

    for page in pages {
        if page.page_number == 1 {
            corpus.rating = page.rating;
        }

        let summary = PageSummary {
            page_number: page.page_number,
            titles: page.titles.len(),
            reviews: page.review_bodies.len(),
            first_review: corpus.review_bodies.len(),
            error: page.error.as_ref().map(ToString::to_string),
        };
        corpus.pages.push(summary);

        if let Some(err) = page.error {
            failures.push(PageFailure {
                page_number: page.page_number,
                reason: err.to_string(),
            });
            continue;
        }

        for (_, title) in page.titles {
            corpus.titles.insert(next_title, title);
            next_title += 1;
        }
        corpus.review_bodies.extend(page.review_bodies);
    }

    (corpus, failures)
}

/// Drives the fetcher and extractor over a product's review pages.
pub struct PaginatedIngestor {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<FieldExtractor>,
    config: FetchConfig,
}

impl PaginatedIngestor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: FieldExtractor, config: FetchConfig) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            config,
        }
    }

    async fn fetch_page(&self, page_number: u32, url: String) -> (PageResult, Option<String>) {
        info!("🔎 Fetching page {}: {}", page_number, url);
        match self.fetcher.fetch(&url).await {
            Ok(html) => {
                let page = self.extractor.extract(&html, page_number == 1);
                info!(
                    "✅ Page {}: {} titles, {} reviews",
                    page_number,
                    page.titles.len(),
                    page.bodies.len()
                );
                let result = PageResult {
                    page_number,
                    titles: page.titles,
                    review_bodies: page.bodies,
                    rating: page.rating,
                    error: None,
                };
                (result, page.next_page)
            }
            Err(e) => {
                warn!("❌ Page {} failed: {}", page_number, e);
                (PageResult::failed(page_number, e), None)
            }
        }
    }

    /// Fetches pages `1..=pages` concurrently, at most `max_concurrency` at
    /// a time, and merges them.
    pub async fn ingest(&self, product_id: &str, pages: u32) -> (CorpusResult, Vec<PageFailure>) {
        let limit = self.config.max_concurrency.max(1);
        let results: Vec<PageResult> = stream::iter(1..=pages)
            .map(|n| {
                let url = self.config.review_page_url(product_id, n);
                async move { self.fetch_page(n, url).await.0 }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        merge_pages(results)
    }

    /// Fetches page 1 and follows next-page links until none is found, a
    /// fetch fails, a link repeats, or `max_pages` pages were visited.
    pub async fn ingest_following(&self, product_id: &str, max_pages: u32) -> (CorpusResult, Vec<PageFailure>) {
        let mut results = Vec::new();
        let mut visited = HashSet::new();
        let mut url = Some(self.config.review_page_url(product_id, 1));
        let mut page_number = 1;

        while let Some(current) = url.take() {
            if page_number > max_pages {
                info!("Reached page cap of {}", max_pages);
                break;
            }
            visited.insert(current.clone());

            let (result, next) = self.fetch_page(page_number, current.clone()).await;
            let failed = result.error.is_some();
            results.push(result);
            if failed {
                break;
            }

            url = next
                .and_then(|href| self.config.resolve_link(&current, &href))
                .filter(|next| {
                    let fresh = !visited.contains(next);
                    if !fresh {
                        warn!("Next-page link {} was already visited, stopping", next);
                    }
                    fresh
                });
            page_number += 1;
        }

        merge_pages(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    fn page(n: u32, bodies: &[&str]) -> PageResult {
        PageResult {
            page_number: n,
            titles: bodies
                .iter()
                .enumerate()
                .map(|(i, b)| (i + 1, format!("title {n}.{}: {b}", i + 1)))
                .collect(),
            review_bodies: bodies.iter().map(|b| b.to_string()).collect(),
            rating: (n == 1).then(|| "4.0 out of 5 stars".to_string()),
            error: None,
        }
    }

    fn html_page(titles_and_bodies: &[(&str, &str)], rating: Option<&str>, next: Option<&str>) -> String {
        let mut html = String::from("<html><body>");
        if let Some(r) = rating {
            html.push_str(&format!(r#"<span data-hook="rating-out-of-text">{r}</span>"#));
        }
        for (title, body) in titles_and_bodies {
            html.push_str(&format!(
                r#"<a class="review-title">{title}</a><span data-hook="review-body">{body}</span>"#
            ));
        }
        if let Some(href) = next {
            html.push_str(&format!(r#"<ul><li class="a-last"><a href="{href}">Next</a></li></ul>"#));
        }
        html.push_str("</body></html>");
        html
    }

    /// Serves canned pages keyed by `pageNumber`, sleeping a per-page delay
    /// to force a chosen completion order.
    struct ScriptedFetcher {
        pages: HashMap<u32, Result<String, FetchError>>,
        delays: HashMap<u32, u64>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(pages: HashMap<u32, Result<String, FetchError>>) -> Self {
            Self {
                pages,
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    fn page_number_of(url: &str) -> u32 {
        url.rsplit("pageNumber=")
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let n = page_number_of(url);
            if let Some(ms) = self.delays.get(&n) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            self.pages
                .get(&n)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn test_config() -> FetchConfig {
        FetchConfig {
            base_url: "https://shop.test".to_string(),
            max_concurrency: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_is_independent_of_completion_order() {
        let pages = vec![
            page(1, &["a", "b", "c"]),
            page(2, &["d"]),
            page(3, &[]),
            page(4, &["e", "f"]),
            PageResult::failed(5, FetchError::Status(503)),
            page(6, &["g"]),
        ];
        let expected = merge_pages(pages.clone());

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut shuffled = pages.clone();
            shuffled.shuffle(&mut rng);
            assert_eq!(merge_pages(shuffled), expected);
        }

        let (corpus, failures) = expected;
        assert_eq!(corpus.review_bodies, vec!["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(corpus.review_bodies.len(), 3 + 1 + 0 + 2 + 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].page_number, 5);
    }

    #[test]
    fn test_titles_renumbered_by_encounter_order() {
        let (corpus, _) = merge_pages(vec![page(2, &["x", "y"]), page(1, &["a"])]);
        let keys: Vec<usize> = corpus.titles.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(corpus.titles[&1], "title 1.1: a");
        assert_eq!(corpus.titles[&2], "title 2.1: x");
        assert_eq!(corpus.titles[&3], "title 2.2: y");
    }

    #[test]
    fn test_rating_absent_when_page_one_fails() {
        let mut second = page(2, &["x"]);
        second.rating = Some("should be ignored".to_string());
        let (corpus, failures) = merge_pages(vec![
            PageResult::failed(1, FetchError::Transport("timeout".into())),
            second,
        ]);
        assert_eq!(corpus.rating, None);
        assert_eq!(corpus.review_bodies, vec!["x"]);
        assert_eq!(failures[0].reason, "transport error: timeout");
    }

    #[test]
    fn test_page_summaries_track_offsets() {
        let (corpus, _) = merge_pages(vec![page(1, &["a", "b"]), page(2, &["c"])]);
        assert_eq!(corpus.pages[0].first_review, 0);
        assert_eq!(corpus.pages[1].first_review, 2);
        assert_eq!(corpus.pages[1].reviews, 1);
    }

    #[tokio::test]
    async fn test_concurrent_ingest_with_reversed_completion() {
        let mut pages = HashMap::new();
        pages.insert(1, Ok(html_page(&[("t1", "one")], Some("4.5 out of 5 stars"), None)));
        pages.insert(2, Ok(html_page(&[("t2", "two"), ("t3", "three")], None, None)));
        pages.insert(3, Err(FetchError::Status(500)));
        pages.insert(4, Ok(html_page(&[("t4", "four")], Some("ignored"), None)));

        let mut fetcher = ScriptedFetcher::new(pages);
        // Later pages finish first.
        fetcher.delays = HashMap::from([(1, 40), (2, 30), (3, 20), (4, 0)]);

        let ingestor = PaginatedIngestor::new(Arc::new(fetcher), FieldExtractor::default(), test_config());
        let (corpus, failures) = ingestor.ingest("B000TEST", 4).await;

        assert_eq!(corpus.review_bodies, vec!["one", "two", "three", "four"]);
        assert_eq!(corpus.titles.values().cloned().collect::<Vec<_>>(), vec!["t1", "t2", "t3", "t4"]);
        assert_eq!(corpus.rating.as_deref(), Some("4.5 out of 5 stars"));
        assert_eq!(
            failures,
            vec![PageFailure {
                page_number: 3,
                reason: "http status 500".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_follow_next_stops_without_link() {
        let mut pages = HashMap::new();
        pages.insert(
            1,
            Ok(html_page(&[("t1", "one")], Some("3.9 out of 5 stars"), Some("/product-reviews/P/?pageNumber=2"))),
        );
        pages.insert(2, Ok(html_page(&[("t2", "two")], None, None)));
        pages.insert(3, Ok(html_page(&[("never", "fetched")], None, None)));

        let fetcher = Arc::new(ScriptedFetcher::new(pages));
        let ingestor = PaginatedIngestor::new(fetcher.clone(), FieldExtractor::default(), test_config());
        let (corpus, failures) = ingestor.ingest_following("P", 10).await;

        assert_eq!(corpus.review_bodies, vec!["one", "two"]);
        assert_eq!(corpus.rating.as_deref(), Some("3.9 out of 5 stars"));
        assert!(failures.is_empty());
        assert_eq!(fetcher.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_follow_next_resolves_relative_link() {
        let mut pages = HashMap::new();
        pages.insert(1, Ok(html_page(&[("t1", "one")], None, Some("?pageNumber=2"))));
        pages.insert(2, Ok(html_page(&[("t2", "two")], None, None)));

        let fetcher = Arc::new(ScriptedFetcher::new(pages));
        let ingestor = PaginatedIngestor::new(fetcher.clone(), FieldExtractor::default(), test_config());
        let (corpus, failures) = ingestor.ingest_following("P", 10).await;

        assert_eq!(corpus.review_bodies, vec!["one", "two"]);
        assert!(failures.is_empty());
        let calls = fetcher.calls.lock().unwrap();
        assert_eq!(
            calls[1],
            "https://shop.test/product-reviews/P/ref=cm_cr_dp_d_show_all_btm?pageNumber=2"
        );
    }

    #[tokio::test]
    async fn test_follow_next_stops_on_failure_and_repeats() {
        let mut pages = HashMap::new();
        pages.insert(1, Ok(html_page(&[("t1", "one")], None, Some("/p?pageNumber=2"))));
        pages.insert(2, Err(FetchError::Status(503)));
        let fetcher = Arc::new(ScriptedFetcher::new(pages));
        let ingestor = PaginatedIngestor::new(fetcher.clone(), FieldExtractor::default(), test_config());
        let (corpus, failures) = ingestor.ingest_following("P", 10).await;
        assert_eq!(corpus.review_bodies, vec!["one"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].page_number, 2);

        let mut looping = HashMap::new();
        looping.insert(1, Ok(html_page(&[("t1", "one")], None, Some("/p?pageNumber=2"))));
        looping.insert(2, Ok(html_page(&[("t2", "two")], None, Some("/p?pageNumber=2"))));
        let fetcher = Arc::new(ScriptedFetcher::new(looping));
        let ingestor = PaginatedIngestor::new(fetcher.clone(), FieldExtractor::default(), test_config());
        let (corpus, _) = ingestor.ingest_following("P", 10).await;
        assert_eq!(corpus.review_bodies, vec!["one", "two"]);
        assert_eq!(fetcher.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_follow_next_respects_page_cap() {
        let mut pages = HashMap::new();
        for n in 1..=5u32 {
            let next = format!("/p?pageNumber={}", n + 1);
            pages.insert(n, Ok(html_page(&[("t", "body")], None, Some(&next))));
        }
        let fetcher = Arc::new(ScriptedFetcher::new(pages));
        let ingestor = PaginatedIngestor::new(fetcher.clone(), FieldExtractor::default(), test_config());
        let (corpus, _) = ingestor.ingest_following("P", 3).await;
        assert_eq!(corpus.review_bodies.len(), 3);
        assert_eq!(fetcher.calls.lock().unwrap().len(), 3);
    }
}
