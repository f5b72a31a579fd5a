//! Runtime configuration for fetching review pages.
//!
//! Every option a page fetch understands is a named field here; nothing is
//! passed around as a loose parameter bag.

use crate::error::ConfigError;
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_PROXY_ENDPOINT: &str = "http://api.scraperapi.com/";
pub const DEFAULT_BASE_URL: &str = "https://www.amazon.com";
pub const DEFAULT_PAGES: u32 = 9;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_MAX_FOLLOW_PAGES: u32 = 50;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a page is requested.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Scraping proxy key. `None` fetches the target URL directly.
    pub api_key: Option<String>,
    /// Ask the proxy to forward our request headers (`keep_headers=true`).
    pub forward_headers: bool,
    /// Scraping proxy endpoint, only used with an API key.
    pub endpoint: String,
    /// Site root the review listing URLs are built from.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on pages in flight at once.
    pub max_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            forward_headers: false,
            endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if self.api_key.is_some() {
            Url::parse(&self.endpoint)
                .map_err(|_| ConfigError::InvalidBaseUrl(self.endpoint.clone()))?;
        }
        Ok(())
    }

    /// Listing URL for one page of a product's reviews.
    pub fn review_page_url(&self, product_id: &str, page_number: u32) -> String {
        format!(
            "{}/product-reviews/{}/ref=cm_cr_dp_d_show_all_btm?ie=UTF8&reviewerType=all_reviews&pageNumber={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(product_id.trim_matches('/')),
            page_number
        )
    }

    /// Resolves a (possibly relative) next-page link against the page it was
    /// found on, falling back to the site root when that URL does not parse.
    pub fn resolve_link(&self, current: &str, href: &str) -> Option<String> {
        let base = Url::parse(current)
            .or_else(|_| Url::parse(&self.base_url))
            .ok()?;
        base.join(href).ok().map(String::from)
    }
}

/// How many pages to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Fetch pages `1..=n` concurrently.
    Count(u32),
    /// Follow next-page links one at a time, at most `max_pages` pages.
    FollowNext { max_pages: u32 },
}

impl PageMode {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            PageMode::Count(0) | PageMode::FollowNext { max_pages: 0 } => Err(ConfigError::ZeroPages),
            _ => Ok(()),
        }
    }
}

impl Default for PageMode {
    fn default() -> Self {
        PageMode::Count(DEFAULT_PAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_page_url() {
        let config = FetchConfig::default();
        let url = config.review_page_url("B0BDHWDR12", 3);
        assert_eq!(
            url,
            "https://www.amazon.com/product-reviews/B0BDHWDR12/ref=cm_cr_dp_d_show_all_btm?ie=UTF8&reviewerType=all_reviews&pageNumber=3"
        );
    }

    #[test]
    fn test_resolve_relative_link() {
        let config = FetchConfig {
            base_url: "https://shop.example.com/".to_string(),
            ..Default::default()
        };
        let current = config.review_page_url("X1", 1);
        assert_eq!(
            config.resolve_link(&current, "/product-reviews/X1?pageNumber=2").as_deref(),
            Some("https://shop.example.com/product-reviews/X1?pageNumber=2")
        );
        assert_eq!(
            config.resolve_link(&current, "https://other.example.com/p").as_deref(),
            Some("https://other.example.com/p")
        );
    }

    #[test]
    fn test_resolve_link_is_relative_to_current_page() {
        let config = FetchConfig {
            base_url: "https://shop.example.com/".to_string(),
            ..Default::default()
        };
        let current = "https://shop.example.com/product-reviews/X1/ref=cm?pageNumber=1";
        assert_eq!(
            config.resolve_link(current, "?pageNumber=2").as_deref(),
            Some("https://shop.example.com/product-reviews/X1/ref=cm?pageNumber=2")
        );
        assert_eq!(
            config.resolve_link(current, "ref=next?pageNumber=3").as_deref(),
            Some("https://shop.example.com/product-reviews/X1/ref=next?pageNumber=3")
        );
        assert_eq!(
            config.resolve_link("not a url", "/p?pageNumber=2").as_deref(),
            Some("https://shop.example.com/p?pageNumber=2")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = FetchConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroConcurrency));

        let bad_url = FetchConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        assert_eq!(PageMode::Count(0).validate(), Err(ConfigError::ZeroPages));
        assert!(PageMode::default().validate().is_ok());
    }
}
