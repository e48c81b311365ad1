//! Scrape worker: a long-running service that drains the runnable job pool
//! and executes jobs against the external source.
//!
//! Per cycle the worker:
//! - atomically claims a batch of runnable jobs (oldest first),
//! - dispatches each to the adapter for its target type, sequentially,
//! - persists normalized records and propagates entity freshness,
//! - converts any per-job failure into a RETRY/FAILED transition.
//!
//! The batch size and inter-request delay bound the request rate toward
//! the external site; jobs in a batch never run in parallel. All job state
//! lives in Postgres, so a restarted worker resumes from the persisted
//! queue.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domains::catalog::models::{Category, Navigation, Product, ProductDetail};
use crate::kernel::error::ScrapeError;
use crate::kernel::scrapers::{
    scrape_categories, scrape_navigation, scrape_product_detail, scrape_product_list, PageFetcher,
    PRODUCT_LIST_FETCH_CAP,
};

use super::job::{JobStatus, ScrapeJob, TargetType};

/// Configuration for the scrape worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Jobs claimed per poll; also the upper bound on work between idle sleeps
    pub batch_size: i64,
    /// How long to wait when no jobs are runnable
    pub poll_interval: Duration,
    /// Pause between jobs within a batch (politeness toward the source)
    pub request_delay: Duration,
    /// Deadline for a single job attempt
    pub job_timeout: Duration,
    /// Failed attempts beyond the first before a job goes FAILED
    pub max_retries: i32,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            poll_interval: Duration::from_secs(5),
            request_delay: Duration::from_millis(2000),
            job_timeout: Duration::from_secs(60),
            max_retries: 3,
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl WorkerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.job_concurrency,
            request_delay: Duration::from_millis(config.request_delay_ms),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
            max_retries: config.max_retries,
            ..Default::default()
        }
    }
}

/// A worker that processes scrape jobs from the persisted queue.
pub struct ScrapeWorker {
    pool: PgPool,
    fetcher: Arc<dyn PageFetcher>,
    config: WorkerConfig,
}

impl ScrapeWorker {
    pub fn new(pool: PgPool, fetcher: Arc<dyn PageFetcher>, config: WorkerConfig) -> Self {
        Self {
            pool,
            fetcher,
            config,
        }
    }

    /// Run until the shutdown token is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            batch_size = self.config.batch_size,
            delay_ms = self.config.request_delay.as_millis() as u64,
            "scrape worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let jobs = match ScrapeJob::claim_batch(self.config.batch_size, &self.pool).await {
                Ok(jobs) => jobs,
                Err(e) => {
                    error!(error = %e, "failed to claim jobs");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                    continue;
                }
            };

            if jobs.is_empty() {
                // No jobs available, sleep
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
                continue;
            }

            debug!(count = jobs.len(), "claimed jobs");

            for job in jobs {
                self.run_job(&job, &shutdown).await;

                if shutdown.is_cancelled() {
                    break;
                }

                // Respect rate limits
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.request_delay) => {}
                }
            }
        }

        info!(worker_id = %self.config.worker_id, "scrape worker stopped");
        Ok(())
    }

    /// Execute one claimed job under the attempt deadline and convert the
    /// outcome into a state transition. Never propagates an error to the
    /// loop.
    async fn run_job(&self, job: &ScrapeJob, shutdown: &CancellationToken) {
        info!(job_id = %job.id, target_type = %job.target_type, url = %job.target_url, "processing job");

        let outcome = tokio::select! {
            _ = shutdown.cancelled() => {
                Err(ScrapeError::Fetch("interrupted by worker shutdown".to_string()))
            }
            result = tokio::time::timeout(self.config.job_timeout, self.process(job)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ScrapeError::Fetch(format!(
                        "attempt exceeded {}s deadline",
                        self.config.job_timeout.as_secs()
                    ))),
                }
            }
        };

        match outcome {
            Ok(()) => {
                if let Err(e) = ScrapeJob::mark_completed(job.id, &self.pool).await {
                    error!(job_id = %job.id, error = %e, "failed to mark job completed");
                } else {
                    info!(job_id = %job.id, "job completed");
                }
            }
            Err(e) => {
                let message = e.to_string();
                let next = if e.is_recoverable() {
                    ScrapeJob::disposition_after_failure(job.retry_count, self.config.max_retries)
                } else {
                    JobStatus::Failed
                };

                match next {
                    JobStatus::Retry => {
                        warn!(
                            job_id = %job.id,
                            retry = job.retry_count + 1,
                            max_retries = self.config.max_retries,
                            error = %message,
                            "job failed, will retry"
                        );
                        if let Err(e) = ScrapeJob::mark_retry(job.id, &message, &self.pool).await {
                            error!(job_id = %job.id, error = %e, "failed to mark job for retry");
                        }
                    }
                    _ => {
                        error!(job_id = %job.id, error = %message, "job failed permanently");
                        if let Err(e) = ScrapeJob::mark_failed(job.id, &message, &self.pool).await {
                            error!(job_id = %job.id, error = %e, "failed to mark job failed");
                        }
                    }
                }
            }
        }
    }

    /// Dispatch to the adapter for the job's target type and persist the
    /// normalized results. Success propagates `last_scraped_at` onto every
    /// affected entity.
    async fn process(&self, job: &ScrapeJob) -> Result<(), ScrapeError> {
        let fetcher = self.fetcher.as_ref();

        match job.target_type {
            TargetType::Navigation => {
                let items = scrape_navigation(fetcher, &job.target_url).await?;
                for item in &items {
                    Navigation::upsert_scraped(&item.title, &item.slug, &self.pool).await?;
                }
                if let Some(navigation_id) = job.navigation_id {
                    Navigation::touch_last_scraped(navigation_id, &self.pool).await?;
                }
                info!(job_id = %job.id, count = items.len(), "stored navigation items");
            }
            TargetType::Category => {
                let navigation_id = job.navigation_id.ok_or_else(|| {
                    ScrapeError::InvalidTarget("category job missing navigation reference".into())
                })?;
                let items = scrape_categories(fetcher, &job.target_url).await?;
                for item in &items {
                    Category::upsert_scraped(navigation_id, item, &self.pool).await?;
                }
                if let Some(category_id) = job.category_id {
                    Category::touch_last_scraped(category_id, &self.pool).await?;
                }
                info!(job_id = %job.id, count = items.len(), "stored categories");
            }
            TargetType::ProductList => {
                let records =
                    scrape_product_list(fetcher, &job.target_url, PRODUCT_LIST_FETCH_CAP).await?;
                for record in &records {
                    Product::upsert_scraped(record, job.category_id, &self.pool).await?;
                }
                if let Some(category_id) = job.category_id {
                    Category::refresh_product_count(category_id, &self.pool).await?;
                }
                info!(job_id = %job.id, count = records.len(), "stored products");
            }
            TargetType::ProductDetail => {
                let product_id = job.product_id.ok_or_else(|| {
                    ScrapeError::InvalidTarget("detail job missing product reference".into())
                })?;
                let detail = scrape_product_detail(fetcher, &job.target_url).await?;
                ProductDetail::upsert_scraped(product_id, &detail, &self.pool).await?;
                if let Some(canonical_url) = &detail.canonical_url {
                    Product::set_source_url(product_id, canonical_url, &self.pool).await?;
                }
                Product::touch_last_scraped(product_id, &self.pool).await?;
                info!(job_id = %job.id, product_id, "stored product detail");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 2);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_delay, Duration::from_millis(2000));
        assert!(config.worker_id.starts_with("worker-"));
    }
}
