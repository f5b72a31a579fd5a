//! Pulls review titles, bodies, the star rating and the next-page link out of
//! a review listing page.

use crate::error::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::warn;

pub const TITLE_SELECTOR: &str = "a.review-title, [data-hook='review-title']";
pub const BODY_SELECTOR: &str = "span[data-hook='review-body']";
pub const RATING_SELECTOR: &str = "span[data-hook='rating-out-of-text']";
pub const NEXT_PAGE_SELECTOR: &str = "li.a-last a[href]";

/// Fields extracted from a single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    /// 1-based local index in encounter order → trimmed title.
    pub titles: BTreeMap<usize, String>,
    /// Trimmed review bodies, parallel to `titles`.
    pub bodies: Vec<String>,
    pub rating: Option<String>,
    pub next_page: Option<String>,
}

/// Selector set for review pages.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    title: Selector,
    body: Selector,
    rating: Selector,
    next_page: Selector,
}

impl FieldExtractor {
    pub fn new(title: &str, body: &str, rating: &str, next_page: &str) -> Result<Self, ConfigError> {
        let parse = |s: &str| Selector::parse(s).map_err(|_| ConfigError::InvalidSelector(s.to_string()));
        Ok(Self {
            title: parse(title)?,
            body: parse(body)?,
            rating: parse(rating)?,
            next_page: parse(next_page)?,
        })
    }

    /// Extracts all fields. The rating is only looked for when
    /// `want_rating` is set (first page); its absence is logged, not fatal.
    pub fn extract(&self, html: &str, want_rating: bool) -> ExtractedPage {
        let document = Html::parse_document(html);

        let titles = document
            .select(&self.title)
            .enumerate()
            .map(|(i, el)| (i + 1, element_text(el)))
            .collect();

        let bodies = document.select(&self.body).map(element_text).collect();

        let rating = if want_rating {
            let rating = document
                .select(&self.rating)
                .next()
                .map(element_text)
                .filter(|r| !r.is_empty());
            if rating.is_none() {
                warn!("⚠️ Star rating marker not found on first page");
            }
            rating
        } else {
            None
        };

        let next_page = document
            .select(&self.next_page)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty());

        ExtractedPage {
            titles,
            bodies,
            rating,
            next_page,
        }
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self {
            title: Selector::parse(TITLE_SELECTOR).expect("valid title selector"),
            body: Selector::parse(BODY_SELECTOR).expect("valid body selector"),
            rating: Selector::parse(RATING_SELECTOR).expect("valid rating selector"),
            next_page: Selector::parse(NEXT_PAGE_SELECTOR).expect("valid next-page selector"),
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
