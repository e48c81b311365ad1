//! Job model for background scrape execution.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// What a scrape job fetches from the external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "scrape_target_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Navigation,
    Category,
    ProductList,
    ProductDetail,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::Navigation => write!(f, "NAVIGATION"),
            TargetType::Category => write!(f, "CATEGORY"),
            TargetType::ProductList => write!(f, "PRODUCT_LIST"),
            TargetType::ProductDetail => write!(f, "PRODUCT_DETAIL"),
        }
    }
}

/// Job lifecycle state.
///
/// PENDING → RUNNING → {COMPLETED, RETRY, FAILED}; RETRY → RUNNING.
/// COMPLETED and FAILED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "scrape_job_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Retry,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether a job in this state is eligible for a worker claim.
    pub fn is_runnable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Retry)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// ============================================================================
// Job Model
// ============================================================================

/// One unit of scrape work, persisted in `scrape_jobs`.
///
/// Created by [`super::ScrapeService`], mutated only by the worker during
/// execution, never deleted. At most one of the entity references is
/// meaningful per target type (PRODUCT_LIST also carries the owning
/// category for upserted products).
#[derive(FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    pub id: Uuid,
    pub target_type: TargetType,
    pub target_url: String,
    pub navigation_id: Option<i64>,
    pub category_id: Option<i64>,
    pub product_id: Option<i64>,
    pub status: JobStatus,
    pub retry_count: i32,
    pub error_log: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ScrapeJob {
    /// State after a failed attempt: re-enter the runnable pool while
    /// retries remain, otherwise terminal failure. A job therefore runs
    /// `max_retries + 1` attempts before failing, ending with
    /// `retry_count == max_retries`.
    pub fn disposition_after_failure(retry_count: i32, max_retries: i32) -> JobStatus {
        if retry_count < max_retries {
            JobStatus::Retry
        } else {
            JobStatus::Failed
        }
    }

    /// Insert a new PENDING job for a resolved target.
    pub async fn enqueue(
        target_type: TargetType,
        target_url: &str,
        navigation_id: Option<i64>,
        category_id: Option<i64>,
        product_id: Option<i64>,
        pool: &PgPool,
    ) -> Result<Self> {
        let job = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO scrape_jobs (id, target_type, target_url, navigation_id, category_id, product_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(target_type)
        .bind(target_url)
        .bind(navigation_id)
        .bind(category_id)
        .bind(product_id)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>("SELECT * FROM scrape_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(job)
    }

    /// Find a non-terminal job for the same target, if any. Used by the
    /// enqueue path to avoid duplicate work under concurrent stale reads.
    pub async fn find_active_for_target(
        target_type: TargetType,
        navigation_id: Option<i64>,
        category_id: Option<i64>,
        product_id: Option<i64>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM scrape_jobs
            WHERE target_type = $1
              AND status IN ('PENDING', 'RETRY', 'RUNNING')
              AND navigation_id IS NOT DISTINCT FROM $2
              AND category_id IS NOT DISTINCT FROM $3
              AND product_id IS NOT DISTINCT FROM $4
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(target_type)
        .bind(navigation_id)
        .bind(category_id)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Claim up to `limit` runnable jobs, oldest first, transitioning them
    /// to RUNNING in the same statement. `FOR UPDATE SKIP LOCKED` makes the
    /// claim safe under concurrent workers. `started_at` is preserved
    /// across retries; only the first claim sets it.
    pub async fn claim_batch(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Self>(
            r#"
            WITH runnable AS (
                SELECT id
                FROM scrape_jobs
                WHERE status IN ('PENDING', 'RETRY')
                ORDER BY created_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            ), claimed AS (
                UPDATE scrape_jobs
                SET status = 'RUNNING',
                    started_at = COALESCE(started_at, NOW())
                WHERE id IN (SELECT id FROM runnable)
                RETURNING *
            )
            SELECT * FROM claimed ORDER BY created_at ASC
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(jobs)
    }

    /// RUNNING → COMPLETED. Entity freshness propagation happens in the
    /// worker before this transition.
    pub async fn mark_completed(id: Uuid, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scrape_jobs
            SET status = 'COMPLETED', finished_at = NOW()
            WHERE id = $1 AND status = 'RUNNING'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// RUNNING → RETRY. Overwrites the error log and re-enters the
    /// runnable pool; `finished_at` stays NULL.
    pub async fn mark_retry(id: Uuid, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scrape_jobs
            SET status = 'RETRY', retry_count = retry_count + 1, error_log = $2
            WHERE id = $1 AND status = 'RUNNING'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// RUNNING → FAILED. Terminal; only a newly enqueued job for the same
    /// target supersedes it.
    pub async fn mark_failed(id: Uuid, error: &str, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE scrape_jobs
            SET status = 'FAILED', finished_at = NOW(), error_log = $2
            WHERE id = $1 AND status = 'RUNNING'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_and_retry_are_runnable() {
        assert!(JobStatus::Pending.is_runnable());
        assert!(JobStatus::Retry.is_runnable());
        assert!(!JobStatus::Running.is_runnable());
        assert!(!JobStatus::Completed.is_runnable());
        assert!(!JobStatus::Failed.is_runnable());
    }

    #[test]
    fn completed_and_failed_are_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Retry.is_terminal());
    }

    #[test]
    fn always_failing_job_fails_after_max_retries_plus_one_attempts() {
        let max_retries = 3;
        let mut retry_count = 0;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match ScrapeJob::disposition_after_failure(retry_count, max_retries) {
                JobStatus::Retry => retry_count += 1,
                JobStatus::Failed => break,
                other => panic!("unexpected disposition {:?}", other),
            }
        }

        assert_eq!(attempts, max_retries + 1);
        assert_eq!(retry_count, max_retries);
    }

    #[test]
    fn zero_max_retries_fails_on_first_attempt() {
        assert_eq!(
            ScrapeJob::disposition_after_failure(0, 0),
            JobStatus::Failed
        );
    }

    #[test]
    fn target_type_display_matches_wire_format() {
        assert_eq!(TargetType::Navigation.to_string(), "NAVIGATION");
        assert_eq!(TargetType::ProductList.to_string(), "PRODUCT_LIST");
        assert_eq!(TargetType::ProductDetail.to_string(), "PRODUCT_DETAIL");
    }
}
