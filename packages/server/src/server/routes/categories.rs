//! Category read endpoints with the same lazy-refresh wiring as navigation.

use axum::{
    extract::{Extension, Path},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::domains::catalog::models::Category;
use crate::kernel::{classify, Freshness};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub navigation_id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub product_count: i32,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub children: Vec<CategoryResponse>,
    pub staleness: Freshness,
}

/// GET /api/categories/:navigation_id
pub async fn list_categories(
    Extension(state): Extension<AppState>,
    Path(navigation_id): Path<i64>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = Category::find_top_level(navigation_id, &state.db_pool).await?;

    let mut results = Vec::with_capacity(categories.len());
    for category in categories {
        let staleness = classify(category.last_scraped_at, state.ttls.category);

        if staleness.needs_refresh() {
            if let Err(e) = state.scrape.enqueue_category(category.id).await {
                warn!(category_id = category.id, error = %e, "failed to enqueue category refresh");
            }
        }

        let children = Category::find_children(category.id, &state.db_pool).await?;
        results.push(to_response(category, children, staleness));
    }

    Ok(Json(results))
}

/// GET /api/categories/detail/:id
pub async fn get_category(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = Category::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category {} not found", id)))?;

    let staleness = classify(category.last_scraped_at, state.ttls.category);
    let children = Category::find_children(category.id, &state.db_pool).await?;

    Ok(Json(to_response(category, children, staleness)))
}

fn to_response(
    category: Category,
    children: Vec<Category>,
    staleness: Freshness,
) -> CategoryResponse {
    let children = children
        .into_iter()
        .map(|child| to_response(child, Vec::new(), staleness))
        .collect();

    CategoryResponse {
        id: category.id,
        navigation_id: category.navigation_id,
        parent_id: category.parent_id,
        title: category.title,
        slug: category.slug,
        description: category.description,
        product_count: category.product_count,
        last_scraped_at: category.last_scraped_at,
        created_at: category.created_at,
        children,
        staleness,
    }
}
