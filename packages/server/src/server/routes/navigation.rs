//! Navigation read endpoints. Stale or never-scraped sections trigger a
//! fire-and-forget refresh enqueue; the response never waits on the worker.

use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domains::catalog::models::Navigation;
use crate::kernel::{classify, Freshness};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub category_count: i64,
    pub staleness: Freshness,
}

/// GET /api/navigation
pub async fn list_navigation(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<NavigationResponse>>, ApiError> {
    let navigations = Navigation::find_all(&state.db_pool).await?;

    let mut results = Vec::with_capacity(navigations.len());
    for nav in navigations {
        let staleness = classify(nav.last_scraped_at, state.ttls.navigation);

        if staleness.needs_refresh() {
            if let Err(e) = state.scrape.enqueue_navigation(nav.id).await {
                warn!(navigation_id = nav.id, error = %e, "failed to enqueue navigation refresh");
            }
        }

        let category_count = Navigation::category_count(nav.id, &state.db_pool).await?;
        results.push(to_response(nav, category_count, staleness));
    }

    Ok(Json(results))
}

/// GET /api/navigation/:id
pub async fn get_navigation(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NavigationResponse>, ApiError> {
    let nav = Navigation::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("navigation {} not found", id)))?;

    let staleness = classify(nav.last_scraped_at, state.ttls.navigation);
    let category_count = Navigation::category_count(nav.id, &state.db_pool).await?;

    Ok(Json(to_response(nav, category_count, staleness)))
}

fn to_response(nav: Navigation, category_count: i64, staleness: Freshness) -> NavigationResponse {
    NavigationResponse {
        id: nav.id,
        title: nav.title,
        slug: nav.slug,
        description: nav.description,
        last_scraped_at: nav.last_scraped_at,
        created_at: nav.created_at,
        category_count,
        staleness,
    }
}
