//! Navigation adapter: extracts section headings from the source homepage.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::kernel::error::ScrapeError;

use super::{absolutize, parse_base_url, slugify, PageFetcher, ScrapedNavigation};

/// Fetch the source homepage and extract navigation headings.
pub async fn scrape_navigation(
    fetcher: &dyn PageFetcher,
    target_url: &str,
) -> Result<Vec<ScrapedNavigation>, ScrapeError> {
    let html = fetcher.fetch(target_url).await?;
    let base = parse_base_url(target_url)?;
    let items = parse_navigation(&html, &base);
    debug!(url = %target_url, count = items.len(), "scraped navigation items");
    Ok(items)
}

pub(crate) fn parse_navigation(html: &str, base: &Url) -> Vec<ScrapedNavigation> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(r#"nav a, header a, [role="navigation"] a"#) {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let title = el.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                return None;
            }
            let url = el
                .value()
                .attr("href")
                .and_then(|href| absolutize(href, base))
                .unwrap_or_default();
            Some(ScrapedNavigation {
                slug: slugify(&title),
                title,
                url,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMEPAGE: &str = r#"
        <html><body>
          <header>
            <a href="/en-gb/category/fiction">Fiction Books</a>
          </header>
          <nav>
            <a href="/en-gb/category/non-fiction">Non-Fiction</a>
            <a href="/en-gb/category/children">Children's Books</a>
            <a href="/empty"> </a>
          </nav>
          <main><a href="/ignored">Not navigation</a></main>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://shop.example.com/").unwrap()
    }

    #[test]
    fn extracts_header_and_nav_links() {
        let items = parse_navigation(HOMEPAGE, &base());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Fiction Books");
        assert_eq!(items[0].slug, "fiction-books");
        assert_eq!(items[0].url, "https://shop.example.com/en-gb/category/fiction");
        assert_eq!(items[2].slug, "children's-books");
    }

    #[test]
    fn empty_titles_are_dropped() {
        let items = parse_navigation(HOMEPAGE, &base());
        assert!(items.iter().all(|i| !i.title.is_empty()));
    }

    #[test]
    fn missing_href_yields_empty_url() {
        let html = r#"<nav><a>Bare Link</a></nav>"#;
        let items = parse_navigation(html, &base());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "");
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let fetcher = super::super::testing::StubFetcher::new(vec![]);
        let err = scrape_navigation(&fetcher, "https://shop.example.com/")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(_)));
    }
}
