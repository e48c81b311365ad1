use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// ViewHistory - one tracked page view in an anonymous browsing session.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ViewHistory {
    pub id: i64,
    pub session_id: Uuid,
    pub product_id: Option<i64>,
    pub path_json: serde_json::Value,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ViewHistory {
    pub async fn record(
        session_id: Uuid,
        product_id: Option<i64>,
        path: &str,
        referer: Option<&str>,
        user_agent: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        let view = sqlx::query_as::<_, ViewHistory>(
            r#"
            INSERT INTO view_history (session_id, product_id, path_json, referer, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(product_id)
        .bind(serde_json::json!({ "path": path, "timestamp": Utc::now() }))
        .bind(referer)
        .bind(user_agent)
        .fetch_one(pool)
        .await?;
        Ok(view)
    }

    /// A session's views, oldest first.
    pub async fn find_for_session(
        session_id: Uuid,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let views = sqlx::query_as::<_, ViewHistory>(
            r#"
            SELECT * FROM view_history
            WHERE session_id = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(views)
    }
}
