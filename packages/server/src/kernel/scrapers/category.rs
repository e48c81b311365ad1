//! Category adapter: extracts category tiles from a section listing page.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::kernel::error::ScrapeError;

use super::{
    absolutize, parse_base_url, select_attr, select_text, slugify, PageFetcher, ScrapedCategory,
};

/// Fetch a listing page and extract category entries.
pub async fn scrape_categories(
    fetcher: &dyn PageFetcher,
    target_url: &str,
) -> Result<Vec<ScrapedCategory>, ScrapeError> {
    let html = fetcher.fetch(target_url).await?;
    let base = parse_base_url(target_url)?;
    let items = parse_categories(&html, &base);
    debug!(url = %target_url, count = items.len(), "scraped categories");
    Ok(items)
}

pub(crate) fn parse_categories(html: &str, base: &Url) -> Vec<ScrapedCategory> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("[data-category], .category, .cat-item") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let title = select_text(el, "h3, .title, a")?;
            let slug = el
                .value()
                .attr("data-slug")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| slugify(&title));
            let url = select_attr(el, "a", "href")
                .and_then(|href| absolutize(&href, base))
                .unwrap_or_default();
            let product_count = el
                .value()
                .attr("data-count")
                .and_then(|c| c.trim().parse::<i32>().ok())
                .unwrap_or(0);
            Some(ScrapedCategory {
                title,
                slug,
                url,
                product_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="category" data-slug="crime-thrillers" data-count="120">
            <h3>Crime &amp; Thrillers</h3>
            <a href="/en-gb/category/crime">Browse</a>
          </div>
          <div data-category>
            <a href="/en-gb/category/romance">Romance</a>
          </div>
          <div class="cat-item" data-count="not-a-number">
            <span class="title">Poetry</span>
          </div>
          <div class="category"><span>no title element</span></div>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://shop.example.com/en-gb/categories").unwrap()
    }

    #[test]
    fn extracts_titled_categories_only() {
        let items = parse_categories(LISTING, &base());
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn prefers_data_slug_over_derived_slug() {
        let items = parse_categories(LISTING, &base());
        assert_eq!(items[0].slug, "crime-thrillers");
        assert_eq!(items[0].product_count, 120);
        assert_eq!(items[1].slug, "romance");
    }

    #[test]
    fn links_are_absolutized() {
        let items = parse_categories(LISTING, &base());
        assert_eq!(items[0].url, "https://shop.example.com/en-gb/category/crime");
    }

    #[test]
    fn unparseable_count_defaults_to_zero() {
        let items = parse_categories(LISTING, &base());
        assert_eq!(items[2].title, "Poetry");
        assert_eq!(items[2].product_count, 0);
        assert_eq!(items[2].url, "");
    }
}
