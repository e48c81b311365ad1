//! Manual scrape refresh and job status lookup.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::kernel::jobs::{JobStatus, ScrapeJob, ScrapeRequest, TargetType};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeJobResponse {
    pub id: Uuid,
    pub target_url: String,
    pub target_type: TargetType,
    pub status: JobStatus,
    pub retry_count: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_log: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ScrapeJob> for ScrapeJobResponse {
    fn from(job: ScrapeJob) -> Self {
        Self {
            id: job.id,
            target_url: job.target_url,
            target_type: job.target_type,
            status: job.status,
            retry_count: job.retry_count,
            started_at: job.started_at,
            finished_at: job.finished_at,
            error_log: job.error_log,
            created_at: job.created_at,
        }
    }
}

/// POST /api/scrape/refresh
///
/// Enqueues a scrape job for the requested target and returns the job
/// record for status polling. Unlike the lazy refresh on read paths,
/// errors here are surfaced to the caller.
pub async fn trigger_refresh(
    Extension(state): Extension<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<(StatusCode, Json<ScrapeJobResponse>), ApiError> {
    info!(target_type = %request.target_type, "manual scrape refresh triggered");

    let job_id = state.scrape.enqueue(&request).await?;
    let job = state.scrape.get_status(job_id).await?;

    Ok((StatusCode::CREATED, Json(job.into())))
}

/// GET /api/scrape/job/:job_id
pub async fn get_job_status(
    Extension(state): Extension<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ScrapeJobResponse>, ApiError> {
    let job = state.scrape.get_status(job_id).await?;
    Ok(Json(job.into()))
}
