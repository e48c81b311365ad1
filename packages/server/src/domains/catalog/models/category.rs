use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::kernel::scrapers::ScrapedCategory;

/// Category - a browsable grouping of products under a navigation section.
/// Hierarchical via `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub navigation_id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub product_count: i32,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Category {
    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(category)
    }

    /// Top-level categories of a navigation section.
    pub async fn find_top_level(navigation_id: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE navigation_id = $1 AND parent_id IS NULL
            ORDER BY title
            "#,
        )
        .bind(navigation_id)
        .fetch_all(pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_children(parent_id: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE parent_id = $1 ORDER BY title",
        )
        .bind(parent_id)
        .fetch_all(pool)
        .await?;
        Ok(categories)
    }

    /// Upsert a scraped category under a navigation, keyed by
    /// (navigation_id, slug).
    pub async fn upsert_scraped(
        navigation_id: i64,
        scraped: &ScrapedCategory,
        pool: &PgPool,
    ) -> Result<Self> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (navigation_id, title, slug, product_count, last_scraped_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (navigation_id, slug) DO UPDATE
            SET title = EXCLUDED.title,
                product_count = EXCLUDED.product_count,
                last_scraped_at = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(navigation_id)
        .bind(&scraped.title)
        .bind(&scraped.slug)
        .bind(scraped.product_count)
        .fetch_one(pool)
        .await?;
        Ok(category)
    }

    /// Record a successful refresh of this category.
    pub async fn touch_last_scraped(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE categories SET last_scraped_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Recompute the denormalized product count after a listing scrape.
    pub async fn refresh_product_count(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE categories
            SET product_count = (SELECT COUNT(*) FROM products WHERE category_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
