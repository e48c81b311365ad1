//! Anonymous session view tracking.

use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domains::catalog::models::ViewHistory;
use crate::server::app::AppState;
use crate::server::error::ApiError;

const SESSION_VIEWS_SHOWN: i64 = 50;

lazy_static! {
    static ref PRODUCT_PATH_RE: Regex = Regex::new(r"^/products/(\d+)").unwrap();
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewRequest {
    pub session_id: Uuid,
    pub path: String,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackViewResponse {
    pub success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionViewResponse {
    pub id: i64,
    pub session_id: Uuid,
    pub path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryResponse {
    pub session_id: Uuid,
    pub views: Vec<SessionViewResponse>,
    pub total_views: usize,
}

/// Product id embedded in a tracked frontend path, if any.
pub(crate) fn product_id_from_path(path: &str) -> Option<i64> {
    PRODUCT_PATH_RE
        .captures(path)
        .and_then(|caps| caps[1].parse().ok())
}

/// POST /api/history/track
pub async fn track_view(
    Extension(state): Extension<AppState>,
    Json(request): Json<TrackViewRequest>,
) -> Result<Json<TrackViewResponse>, ApiError> {
    let product_id = product_id_from_path(&request.path);

    ViewHistory::record(
        request.session_id,
        product_id,
        &request.path,
        request.referer.as_deref(),
        request.user_agent.as_deref(),
        &state.db_pool,
    )
    .await?;

    Ok(Json(TrackViewResponse { success: true }))
}

/// GET /api/history/session/:session_id
pub async fn get_session_history(
    Extension(state): Extension<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionHistoryResponse>, ApiError> {
    let views =
        ViewHistory::find_for_session(session_id, SESSION_VIEWS_SHOWN, &state.db_pool).await?;

    let views: Vec<SessionViewResponse> = views
        .into_iter()
        .map(|v| SessionViewResponse {
            id: v.id,
            session_id: v.session_id,
            path: v
                .path_json
                .get("path")
                .and_then(|p| p.as_str())
                .map(|p| p.to_string()),
            timestamp: v.created_at,
        })
        .collect();

    Ok(Json(SessionHistoryResponse {
        session_id,
        total_views: views.len(),
        views,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_paths_are_sniffed() {
        assert_eq!(product_id_from_path("/products/42"), Some(42));
        assert_eq!(product_id_from_path("/products/42?ref=grid"), Some(42));
        assert_eq!(product_id_from_path("/categories/3"), None);
        assert_eq!(product_id_from_path("/products/abc"), None);
    }
}
