//! Scrape adapters - HTTP fetching plus HTML normalization per target kind.
//!
//! Transport is isolated behind [`PageFetcher`] so parsing stays a pure
//! function over HTML strings. Extraction is defensive: a missing element
//! yields an empty/zero field, and records without their identifying key
//! are dropped. The external site's markup is treated as unstable.

pub mod category;
pub mod navigation;
pub mod product;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};
use std::time::Duration;
use url::Url;

use crate::kernel::error::ScrapeError;

pub use category::scrape_categories;
pub use navigation::scrape_navigation;
pub use product::{scrape_product_detail, scrape_product_list, PRODUCT_LIST_FETCH_CAP};

lazy_static! {
    static ref DECIMAL_RE: Regex = Regex::new(r"[\d.]+").unwrap();
    static ref INT_RE: Regex = Regex::new(r"\d+").unwrap();
}

// ============================================================================
// Normalized records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedNavigation {
    pub title: String,
    pub slug: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedCategory {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub product_count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedProduct {
    /// Stable identifier on the external site; the upsert key.
    pub source_id: String,
    pub title: String,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub image_url: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedProductDetail {
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub pages: Option<i32>,
    pub rating: Option<Decimal>,
    pub review_count: i32,
    /// From `link[rel="canonical"]`; applied back to the product's stored
    /// source URL by the worker.
    pub canonical_url: Option<String>,
}

// ============================================================================
// Transport
// ============================================================================

/// Capability to fetch one page of HTML. Implemented by [`HttpFetcher`] in
/// production and by in-memory stubs in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// reqwest-backed fetcher with browser-like headers.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        // Use a browser-like User-Agent to avoid bot detection
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().unwrap(),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Fetch(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Fetch(format!("HTTP {} for {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Fetch(format!("reading body from {} failed: {}", url, e)))
    }
}

// ============================================================================
// Shared extraction helpers
// ============================================================================

/// Lowercased, whitespace collapsed to single dashes.
pub(crate) fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Trimmed text of the first element matching any selector in the
/// comma-separated list, if non-empty.
pub(crate) fn select_text(el: ElementRef<'_>, selectors: &str) -> Option<String> {
    let selector = Selector::parse(selectors).ok()?;
    el.select(&selector)
        .next()
        .map(|m| m.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// An attribute of the first element matching any selector in the list.
pub(crate) fn select_attr(el: ElementRef<'_>, selectors: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selectors).ok()?;
    el.select(&selector)
        .next()
        .and_then(|m| m.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a possibly-relative href against the page URL.
pub(crate) fn absolutize(href: &str, base: &Url) -> Option<String> {
    base.join(href).ok().map(|u| u.to_string())
}

/// First decimal number embedded in scraped text ("£12.99" → 12.99).
pub(crate) fn extract_decimal(text: &str) -> Option<Decimal> {
    DECIMAL_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<Decimal>().ok())
}

/// First integer embedded in scraped text ("352 pages" → 352).
pub(crate) fn extract_int(text: &str) -> Option<i32> {
    INT_RE.find(text).and_then(|m| m.as_str().parse::<i32>().ok())
}

pub(crate) fn parse_base_url(url: &str) -> Result<Url, ScrapeError> {
    Url::parse(url).map_err(|e| ScrapeError::Parse(format!("invalid page URL {}: {}", url, e)))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::PageFetcher;
    use crate::kernel::error::ScrapeError;

    /// In-memory fetcher mapping URLs to canned HTML.
    pub struct StubFetcher {
        pages: HashMap<String, String>,
    }

    impl StubFetcher {
        pub fn new(pages: Vec<(&str, &str)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(u, h)| (u.to_string(), h.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Fetch(format!("HTTP 404 for {}", url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_whitespace() {
        assert_eq!(slugify("Science Fiction"), "science-fiction");
        assert_eq!(slugify("  Crime &  Thrillers "), "crime-&-thrillers");
    }

    #[test]
    fn extract_decimal_pulls_price_from_text() {
        assert_eq!(extract_decimal("£12.99"), Some(Decimal::new(1299, 2)));
        assert_eq!(extract_decimal("no price"), None);
    }

    #[test]
    fn extract_int_pulls_first_number() {
        assert_eq!(extract_int("352 pages"), Some(352));
        assert_eq!(extract_int("(1,204 reviews)"), Some(1));
        assert_eq!(extract_int("none"), None);
    }

    #[test]
    fn absolutize_resolves_relative_links() {
        let base = Url::parse("https://shop.example.com/en-gb/category/fiction").unwrap();
        assert_eq!(
            absolutize("/en-gb/books/dune-herbert/9780340960196", &base).as_deref(),
            Some("https://shop.example.com/en-gb/books/dune-herbert/9780340960196")
        );
        assert_eq!(
            absolutize("https://other.example.com/x", &base).as_deref(),
            Some("https://other.example.com/x")
        );
    }
}
