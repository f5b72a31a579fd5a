//! Page retrieval.
//!
//! [`PageFetcher`] is the seam between the pipeline and the network. The
//! production implementation is [`HttpFetcher`]; tests plug in in-memory
//! fetchers. One attempt per page, no retries.

use crate::config::FetchConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use tracing::debug;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    ]
});

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Retrieves raw page content for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP, either directly or through a scraping proxy.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Builds the request for one page. Every call draws a fresh User-Agent.
    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let req = match &self.config.api_key {
            Some(key) => {
                let mut params = vec![("api_key", key.as_str()), ("url", url)];
                if self.config.forward_headers {
                    params.push(("keep_headers", "true"));
                }
                let req = self.client.get(&self.config.endpoint).query(&params);
                if self.config.forward_headers {
                    req.header("Accept-Language", "en-US,en;q=0.9")
                } else {
                    req
                }
            }
            None => self
                .client
                .get(url)
                .header("Accept-Language", "en-US,en;q=0.9"),
        };
        req.header(USER_AGENT, random_user_agent())
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_USER_AGENT)
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let resp = self.request(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = resp.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxied(forward_headers: bool) -> HttpFetcher {
        HttpFetcher::new(FetchConfig {
            api_key: Some("secret".to_string()),
            forward_headers,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_proxy_request_carries_key_and_target() {
        let fetcher = proxied(false);
        let req = fetcher.request("https://www.amazon.com/x?a=1").build().unwrap();
        let url = req.url().as_str();
        assert!(url.starts_with("http://api.scraperapi.com/"));
        assert!(url.contains("api_key=secret"));
        assert!(url.contains("url=https%3A%2F%2Fwww.amazon.com%2Fx%3Fa%3D1"));
        assert!(!url.contains("keep_headers"));
    }

    #[test]
    fn test_forward_headers_flag() {
        let fetcher = proxied(true);
        let req = fetcher.request("https://www.amazon.com/x").build().unwrap();
        assert!(req.url().as_str().contains("keep_headers=true"));
        assert!(req.headers().contains_key("accept-language"));
    }

    #[test]
    fn test_direct_request_targets_url() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let req = fetcher.request("https://www.amazon.com/x").build().unwrap();
        assert_eq!(req.url().as_str(), "https://www.amazon.com/x");
    }

    #[test]
    fn test_user_agent_drawn_per_request() {
        for fetcher in [HttpFetcher::new(FetchConfig::default()).unwrap(), proxied(true)] {
            let agents: std::collections::HashSet<String> = (0..64)
                .map(|_| {
                    let req = fetcher.request("https://www.amazon.com/x").build().unwrap();
                    let agent = req.headers()[USER_AGENT].to_str().unwrap().to_string();
                    assert!(USER_AGENTS.iter().any(|known| *known == agent));
                    agent
                })
                .collect();
            assert!(agents.len() > 1);
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_without_network() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert_eq!(err, FetchError::InvalidUrl("not a url".to_string()));
    }
}
