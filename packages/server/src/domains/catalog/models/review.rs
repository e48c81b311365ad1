use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Review - a reader review attached to a product. Read-only here; rows
/// are seeded or imported, never scraped.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub author: String,
    pub rating: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Latest reviews for a product.
    pub async fn find_recent_for_product(
        product_id: i64,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(reviews)
    }
}
