use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Navigation - a top-level section of the mirrored catalog
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Navigation {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Navigation {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let navigations =
            sqlx::query_as::<_, Navigation>("SELECT * FROM navigations ORDER BY id")
                .fetch_all(pool)
                .await?;
        Ok(navigations)
    }

    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let navigation =
            sqlx::query_as::<_, Navigation>("SELECT * FROM navigations WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(navigation)
    }

    /// Number of top-level categories in this navigation.
    pub async fn category_count(id: i64, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE navigation_id = $1 AND parent_id IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Upsert a scraped navigation heading, keyed by slug. Creation counts
    /// as an initial scrape, so `last_scraped_at` is set either way.
    pub async fn upsert_scraped(title: &str, slug: &str, pool: &PgPool) -> Result<Self> {
        let navigation = sqlx::query_as::<_, Navigation>(
            r#"
            INSERT INTO navigations (title, slug, last_scraped_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (slug) DO UPDATE
            SET title = EXCLUDED.title,
                last_scraped_at = NOW(),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(slug)
        .fetch_one(pool)
        .await?;
        Ok(navigation)
    }

    /// Record a successful refresh of this navigation.
    pub async fn touch_last_scraped(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE navigations SET last_scraped_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
