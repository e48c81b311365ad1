use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::kernel::scrapers::{ScrapedProduct, ScrapedProductDetail};

/// Product - one mirrored catalog item. `source_id` is the stable
/// identifier on the external site and the upsert key for re-scrapes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub source_id: String,
    pub source_url: String,
    pub title: String,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ProductDetail - 1:1 extension scraped from the product's own page.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductDetail {
    pub product_id: i64,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub pages: Option<i32>,
    pub specs: Option<serde_json::Value>,
    pub ratings_avg: Option<Decimal>,
    pub reviews_count: i32,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Product {
    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(product)
    }

    /// One page of a category's products, newest first.
    pub async fn find_page(
        category_id: i64,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE category_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(products)
    }

    pub async fn count_in_category(category_id: i64, pool: &PgPool) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Recently added products from the same category, excluding the
    /// product itself. Used as recommendations on the detail endpoint.
    pub async fn find_recommendations(
        category_id: i64,
        exclude_id: i64,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE category_id = $1 AND id <> $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(category_id)
        .bind(exclude_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(products)
    }

    /// Upsert a scraped listing record, keyed by `source_id`. Re-running an
    /// identical upsert leaves the row unchanged apart from timestamps,
    /// making re-scrapes idempotent. The category assignment is only set on
    /// first insert; later listing scrapes do not move products between
    /// categories.
    pub async fn upsert_scraped(
        scraped: &ScrapedProduct,
        category_id: Option<i64>,
        pool: &PgPool,
    ) -> Result<Self> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (source_id, source_url, title, author, price, currency, image_url, category_id, last_scraped_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (source_id) DO UPDATE
            SET source_url = EXCLUDED.source_url,
                title = EXCLUDED.title,
                author = EXCLUDED.author,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                last_scraped_at = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&scraped.source_id)
        .bind(&scraped.url)
        .bind(&scraped.title)
        .bind(&scraped.author)
        .bind(scraped.price)
        .bind(&scraped.currency)
        .bind(&scraped.image_url)
        .bind(category_id)
        .fetch_one(pool)
        .await?;
        Ok(product)
    }

    /// Apply a canonical-URL correction found during a detail scrape.
    pub async fn set_source_url(id: i64, source_url: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE products SET source_url = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(source_url)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful refresh of this product.
    pub async fn touch_last_scraped(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE products SET last_scraped_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

impl ProductDetail {
    pub async fn find_by_product(product_id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let detail =
            sqlx::query_as::<_, ProductDetail>("SELECT * FROM product_details WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(pool)
                .await?;
        Ok(detail)
    }

    /// Upsert the scraped detail record for a product.
    pub async fn upsert_scraped(
        product_id: i64,
        scraped: &ScrapedProductDetail,
        pool: &PgPool,
    ) -> Result<Self> {
        let detail = sqlx::query_as::<_, ProductDetail>(
            r#"
            INSERT INTO product_details (product_id, description, isbn, publisher, pages, ratings_avg, reviews_count, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (product_id) DO UPDATE
            SET description = EXCLUDED.description,
                isbn = EXCLUDED.isbn,
                publisher = EXCLUDED.publisher,
                pages = EXCLUDED.pages,
                ratings_avg = EXCLUDED.ratings_avg,
                reviews_count = EXCLUDED.reviews_count,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(&scraped.description)
        .bind(&scraped.isbn)
        .bind(&scraped.publisher)
        .bind(scraped.pages)
        .bind(scraped.rating)
        .bind(scraped.review_count)
        .fetch_one(pool)
        .await?;
        Ok(detail)
    }
}
