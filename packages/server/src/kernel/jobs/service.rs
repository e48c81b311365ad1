//! Enqueue service: validates a scrape request, resolves the target URL,
//! and creates the job record. Read paths call the convenience wrappers
//! fire-and-forget; the manual refresh endpoint calls [`ScrapeService::enqueue`]
//! directly and surfaces errors.

use sqlx::PgPool;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::domains::catalog::models::{Category, Navigation, Product};
use crate::kernel::error::ScrapeError;

use super::job::{ScrapeJob, TargetType};

/// A request to refresh one target, as accepted by the manual refresh
/// endpoint. The identifying field required depends on `target_type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub target_type: TargetType,
    pub navigation_id: Option<i64>,
    pub category_id: Option<i64>,
    pub product_id: Option<i64>,
}

impl ScrapeRequest {
    fn navigation(id: i64) -> Self {
        Self {
            target_type: TargetType::Navigation,
            navigation_id: Some(id),
            category_id: None,
            product_id: None,
        }
    }

    fn category(id: i64) -> Self {
        Self {
            target_type: TargetType::Category,
            navigation_id: None,
            category_id: Some(id),
            product_id: None,
        }
    }

    fn product_list(category_id: i64) -> Self {
        Self {
            target_type: TargetType::ProductList,
            navigation_id: None,
            category_id: Some(category_id),
            product_id: None,
        }
    }

    fn product_detail(product_id: i64) -> Self {
        Self {
            target_type: TargetType::ProductDetail,
            navigation_id: None,
            category_id: None,
            product_id: Some(product_id),
        }
    }
}

/// Creates scrape jobs and answers status lookups.
pub struct ScrapeService {
    pool: PgPool,
    /// Configured external origin used for listing-style targets.
    target_url: String,
}

impl ScrapeService {
    pub fn new(pool: PgPool, target_url: String) -> Self {
        Self { pool, target_url }
    }

    /// Validate the request, resolve its target URL, and create a PENDING
    /// job. Returns the existing job id when one is already queued or
    /// running for the same target.
    pub async fn enqueue(&self, request: &ScrapeRequest) -> Result<Uuid, ScrapeError> {
        let (target_url, navigation_id, category_id, product_id) =
            self.resolve_target(request).await?;

        if let Some(existing) = ScrapeJob::find_active_for_target(
            request.target_type,
            navigation_id,
            category_id,
            product_id,
            &self.pool,
        )
        .await?
        {
            debug!(
                job_id = %existing.id,
                target_type = %request.target_type,
                "scrape already queued for target"
            );
            return Ok(existing.id);
        }

        let job = ScrapeJob::enqueue(
            request.target_type,
            &target_url,
            navigation_id,
            category_id,
            product_id,
            &self.pool,
        )
        .await?;

        debug!(job_id = %job.id, target_type = %request.target_type, "created scrape job");
        Ok(job.id)
    }

    /// Check the referenced entity exists and derive the URL the worker
    /// will fetch. Listing targets use the configured external origin;
    /// PRODUCT_DETAIL uses the product's own stored source URL.
    async fn resolve_target(
        &self,
        request: &ScrapeRequest,
    ) -> Result<(String, Option<i64>, Option<i64>, Option<i64>), ScrapeError> {
        match request.target_type {
            TargetType::Navigation => {
                let id = request.navigation_id.ok_or_else(|| {
                    ScrapeError::InvalidTarget("navigationId required for NAVIGATION scrape".into())
                })?;
                Navigation::find_by_id(id, &self.pool)
                    .await?
                    .ok_or_else(|| ScrapeError::NotFound(format!("navigation {}", id)))?;
                Ok((self.target_url.clone(), Some(id), None, None))
            }
            TargetType::Category => {
                let id = request.category_id.ok_or_else(|| {
                    ScrapeError::InvalidTarget("categoryId required for CATEGORY scrape".into())
                })?;
                let category = Category::find_by_id(id, &self.pool)
                    .await?
                    .ok_or_else(|| ScrapeError::NotFound(format!("category {}", id)))?;
                Ok((
                    self.target_url.clone(),
                    Some(category.navigation_id),
                    Some(id),
                    None,
                ))
            }
            TargetType::ProductList => {
                let id = request.category_id.ok_or_else(|| {
                    ScrapeError::InvalidTarget("categoryId required for PRODUCT_LIST scrape".into())
                })?;
                Category::find_by_id(id, &self.pool)
                    .await?
                    .ok_or_else(|| ScrapeError::NotFound(format!("category {}", id)))?;
                Ok((self.target_url.clone(), None, Some(id), None))
            }
            TargetType::ProductDetail => {
                let id = request.product_id.ok_or_else(|| {
                    ScrapeError::InvalidTarget(
                        "productId required for PRODUCT_DETAIL scrape".into(),
                    )
                })?;
                let product = Product::find_by_id(id, &self.pool)
                    .await?
                    .ok_or_else(|| ScrapeError::NotFound(format!("product {}", id)))?;
                Ok((product.source_url, None, None, Some(id)))
            }
        }
    }

    /// Pure status lookup by job id.
    pub async fn get_status(&self, job_id: Uuid) -> Result<ScrapeJob, ScrapeError> {
        ScrapeJob::find_by_id(job_id, &self.pool)
            .await?
            .ok_or_else(|| ScrapeError::NotFound(format!("scrape job {}", job_id)))
    }

    /// Enqueue a navigation refresh.
    pub async fn enqueue_navigation(&self, navigation_id: i64) -> Result<Uuid, ScrapeError> {
        self.enqueue(&ScrapeRequest::navigation(navigation_id)).await
    }

    /// Enqueue a category refresh.
    pub async fn enqueue_category(&self, category_id: i64) -> Result<Uuid, ScrapeError> {
        self.enqueue(&ScrapeRequest::category(category_id)).await
    }

    /// Enqueue a product listing refresh for a category.
    pub async fn enqueue_product_list(&self, category_id: i64) -> Result<Uuid, ScrapeError> {
        self.enqueue(&ScrapeRequest::product_list(category_id)).await
    }

    /// Enqueue a product detail refresh.
    pub async fn enqueue_product_detail(&self, product_id: i64) -> Result<Uuid, ScrapeError> {
        self.enqueue(&ScrapeRequest::product_detail(product_id)).await
    }
}
