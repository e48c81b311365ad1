//! Product adapters: the paginated listing scrape and the single-page
//! detail scrape.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::kernel::error::ScrapeError;

use super::{
    absolutize, extract_decimal, extract_int, parse_base_url, select_attr, select_text,
    PageFetcher, ScrapedProduct, ScrapedProductDetail,
};

/// Upper bound on page fetches for one listing job; guarantees termination
/// even under pathological pagination.
pub const PRODUCT_LIST_FETCH_CAP: usize = 50;

lazy_static! {
    /// Listing detail links of the form `/books/{title-author}/{isbn}`.
    static ref BOOK_URL_RE: Regex = Regex::new(r"/books/([^/]+)/(\d+)$").unwrap();
}

/// Fetch a listing and every `next` page after it, up to `fetch_cap` page
/// fetches in total, accumulating normalized product records.
pub async fn scrape_product_list(
    fetcher: &dyn PageFetcher,
    start_url: &str,
    fetch_cap: usize,
) -> Result<Vec<ScrapedProduct>, ScrapeError> {
    let mut records = Vec::new();
    let mut next = Some(start_url.to_string());
    let mut fetched = 0;

    while let Some(url) = next {
        if fetched >= fetch_cap {
            debug!(url = %url, fetch_cap, "stopping pagination at fetch cap");
            break;
        }
        fetched += 1;

        let html = fetcher.fetch(&url).await?;
        let base = parse_base_url(&url)?;
        let page = parse_product_list(&html, &base);

        debug!(url = %url, count = page.records.len(), "scraped product listing page");
        records.extend(page.records);
        next = page.next_url;
    }

    Ok(records)
}

/// Fetch exactly one product page and extract its detail record.
pub async fn scrape_product_detail(
    fetcher: &dyn PageFetcher,
    product_url: &str,
) -> Result<ScrapedProductDetail, ScrapeError> {
    let html = fetcher.fetch(product_url).await?;
    Ok(parse_product_detail(&html))
}

pub(crate) struct ProductListPage {
    pub records: Vec<ScrapedProduct>,
    pub next_url: Option<String>,
}

pub(crate) fn parse_product_list(html: &str, base: &Url) -> ProductListPage {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("[data-product], .product, .book-item") {
        Ok(s) => s,
        Err(_) => {
            return ProductListPage {
                records: vec![],
                next_url: None,
            }
        }
    };

    let records = document
        .select(&selector)
        .filter_map(|el| {
            // Records without their external identifier cannot be upserted
            // and are dropped.
            let source_id = el
                .value()
                .attr("data-id")
                .or_else(|| el.value().attr("data-product-id"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())?;

            let url = select_attr(el, "a", "href")
                .and_then(|href| absolutize(&href, base))
                .map(|u| rewrite_detail_url(&u, base))
                .unwrap_or_default();

            Some(ScrapedProduct {
                source_id,
                title: select_text(el, ".title, h3, .product-title").unwrap_or_default(),
                author: select_text(el, ".author, .by-author"),
                price: select_text(el, ".price, [data-price]")
                    .as_deref()
                    .and_then(extract_decimal),
                currency: "GBP".to_string(),
                image_url: select_attr(el, "img", "src"),
                url,
            })
        })
        .collect();

    let next_url = Selector::parse(".pagination .next a")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| absolutize(href, base))
        });

    ProductListPage { records, next_url }
}

/// Rewrite a `/books/{title-author}/{isbn}` listing link into the canonical
/// `/en-gb/products/{title}-book-{author}-{isbn}` detail URL.
pub(crate) fn rewrite_detail_url(url: &str, base: &Url) -> String {
    let Some(caps) = BOOK_URL_RE.captures(url) else {
        return url.to_string();
    };
    let title_author = &caps[1];
    let isbn = &caps[2];

    let mut parts: Vec<&str> = title_author.split('-').collect();
    if parts.len() < 2 {
        return url.to_string();
    }
    let Some(author) = parts.pop() else {
        return url.to_string();
    };
    let title = parts.join("-");

    format!(
        "{}/en-gb/products/{}-book-{}-{}",
        base.origin().ascii_serialization(),
        title,
        author,
        isbn
    )
}

pub(crate) fn parse_product_detail(html: &str) -> ScrapedProductDetail {
    let document = Html::parse_document(html);

    let doc_text = |selectors: &str| -> Option<String> {
        let selector = Selector::parse(selectors).ok()?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    };

    let canonical_url = Selector::parse(r#"link[rel="canonical"]"#)
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });

    ScrapedProductDetail {
        description: doc_text(".description, .product-description"),
        isbn: doc_text("[data-isbn], .isbn"),
        publisher: doc_text("[data-publisher], .publisher"),
        pages: doc_text("[data-pages], .pages")
            .as_deref()
            .and_then(extract_int),
        rating: doc_text("[data-rating], .rating")
            .as_deref()
            .and_then(extract_decimal),
        review_count: doc_text("[data-review-count], .review-count")
            .as_deref()
            .and_then(extract_int)
            .unwrap_or(0),
        canonical_url,
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::StubFetcher;
    use super::*;
    use rust_decimal::Decimal;

    const PAGE_ONE: &str = r#"
        <html><body>
          <div class="product" data-id="bk-101">
            <h3 class="title">Dune</h3>
            <span class="author">Frank Herbert</span>
            <span class="price">£9.99</span>
            <img src="/images/dune.jpg">
            <a href="/en-gb/books/dune-herbert/9780340960196">View</a>
          </div>
          <div class="book-item" data-product-id="bk-102">
            <h3>Untitled Stub</h3>
          </div>
          <div class="product">
            <h3 class="title">No identifier, dropped</h3>
          </div>
          <div class="pagination"><span class="next"><a href="/en-gb/category/sf?page=2">Next</a></span></div>
        </body></html>
    "#;

    const PAGE_TWO: &str = r#"
        <html><body>
          <div class="product" data-id="bk-103">
            <h3 class="title">Hyperion</h3>
            <span class="price">12.50</span>
          </div>
        </body></html>
    "#;

    fn base() -> Url {
        Url::parse("https://shop.example.com/en-gb/category/sf").unwrap()
    }

    #[test]
    fn parses_records_and_drops_missing_source_id() {
        let page = parse_product_list(PAGE_ONE, &base());
        assert_eq!(page.records.len(), 2);

        let dune = &page.records[0];
        assert_eq!(dune.source_id, "bk-101");
        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(dune.price, Some(Decimal::new(999, 2)));
        assert_eq!(dune.currency, "GBP");
        assert_eq!(
            dune.image_url.as_deref(),
            Some("https://shop.example.com/images/dune.jpg")
        );
    }

    #[test]
    fn partial_records_keep_empty_fields() {
        let page = parse_product_list(PAGE_ONE, &base());
        let stub = &page.records[1];
        assert_eq!(stub.source_id, "bk-102");
        assert_eq!(stub.title, "Untitled Stub");
        assert_eq!(stub.author, None);
        assert_eq!(stub.price, None);
        assert_eq!(stub.url, "");
    }

    #[test]
    fn next_link_is_absolutized() {
        let page = parse_product_list(PAGE_ONE, &base());
        assert_eq!(
            page.next_url.as_deref(),
            Some("https://shop.example.com/en-gb/category/sf?page=2")
        );
    }

    #[test]
    fn book_links_are_rewritten_to_product_urls() {
        let page = parse_product_list(PAGE_ONE, &base());
        assert_eq!(
            page.records[0].url,
            "https://shop.example.com/en-gb/products/dune-book-herbert-9780340960196"
        );
    }

    #[test]
    fn rewrite_keeps_multi_word_titles_together() {
        let rewritten = rewrite_detail_url(
            "https://shop.example.com/en-gb/books/dune-frank-herbert/9780340960196",
            &base(),
        );
        assert_eq!(
            rewritten,
            "https://shop.example.com/en-gb/products/dune-frank-book-herbert-9780340960196"
        );
    }

    #[test]
    fn rewrite_leaves_other_urls_untouched() {
        let url = "https://shop.example.com/en-gb/products/already-canonical-1234";
        assert_eq!(rewrite_detail_url(url, &base()), url);

        let single_part = "https://shop.example.com/en-gb/books/dune/9780340960196";
        assert_eq!(rewrite_detail_url(single_part, &base()), single_part);
    }

    #[tokio::test]
    async fn follows_next_links_up_to_fetch_cap() {
        let fetcher = StubFetcher::new(vec![
            ("https://shop.example.com/en-gb/category/sf", PAGE_ONE),
            ("https://shop.example.com/en-gb/category/sf?page=2", PAGE_TWO),
        ]);

        let both = scrape_product_list(&fetcher, "https://shop.example.com/en-gb/category/sf", 2)
            .await
            .unwrap();
        assert_eq!(both.len(), 3);
        assert_eq!(both[2].source_id, "bk-103");

        let first_only =
            scrape_product_list(&fetcher, "https://shop.example.com/en-gb/category/sf", 1)
                .await
                .unwrap();
        assert_eq!(first_only.len(), 2);
    }

    #[tokio::test]
    async fn fetch_error_mid_pagination_propagates() {
        // Page two is missing from the stub; the whole target fails.
        let fetcher = StubFetcher::new(vec![(
            "https://shop.example.com/en-gb/category/sf",
            PAGE_ONE,
        )]);

        let err = scrape_product_list(&fetcher, "https://shop.example.com/en-gb/category/sf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(_)));
    }

    const DETAIL_PAGE: &str = r#"
        <html>
          <head><link rel="canonical" href="https://shop.example.com/en-gb/products/dune-book-herbert-9780340960196"></head>
          <body>
            <div class="product-description">A landmark of science fiction.</div>
            <span class="isbn">9780340960196</span>
            <span data-publisher>Hodder</span>
            <span class="pages">592 pages</span>
            <span class="rating">4.5 out of 5</span>
            <span class="review-count">1287 reviews</span>
          </body>
        </html>
    "#;

    #[test]
    fn parses_detail_fields() {
        let detail = parse_product_detail(DETAIL_PAGE);
        assert_eq!(
            detail.description.as_deref(),
            Some("A landmark of science fiction.")
        );
        assert_eq!(detail.isbn.as_deref(), Some("9780340960196"));
        assert_eq!(detail.publisher.as_deref(), Some("Hodder"));
        assert_eq!(detail.pages, Some(592));
        assert_eq!(detail.rating, Some(Decimal::new(45, 1)));
        assert_eq!(detail.review_count, 1287);
        assert_eq!(
            detail.canonical_url.as_deref(),
            Some("https://shop.example.com/en-gb/products/dune-book-herbert-9780340960196")
        );
    }

    #[test]
    fn missing_detail_elements_yield_empty_record() {
        let detail = parse_product_detail("<html><body><p>bare page</p></body></html>");
        assert_eq!(detail.description, None);
        assert_eq!(detail.pages, None);
        assert_eq!(detail.rating, None);
        assert_eq!(detail.review_count, 0);
        assert_eq!(detail.canonical_url, None);
    }
}
