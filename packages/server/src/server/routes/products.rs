//! Product read endpoints: paginated grid per category and the full detail
//! view with reviews and recommendations.

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::{clamp_limit, clamp_page, Paginated};
use crate::domains::catalog::models::{Product, ProductDetail, Review};
use crate::kernel::{classify, Freshness};
use crate::server::app::AppState;
use crate::server::error::ApiError;

const REVIEWS_SHOWN: i64 = 10;
const RECOMMENDATIONS_SHOWN: i64 = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i64,
    pub source_id: String,
    pub source_url: String,
    pub title: String,
    pub author: Option<String>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub last_scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staleness: Option<Freshness>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailFields {
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub pages: Option<i32>,
    pub specs: Option<serde_json::Value>,
    pub ratings_avg: Option<Decimal>,
    pub reviews_count: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: i64,
    pub author: String,
    pub rating: i32,
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    pub product: ProductResponse,
    pub detail: ProductDetailFields,
    pub reviews: Vec<ReviewResponse>,
    pub recommendations: Vec<ProductResponse>,
    pub staleness: Freshness,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category_id: i64,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/products?categoryId=&page=&limit=
pub async fn list_products(
    Extension(state): Extension<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<ProductResponse>>, ApiError> {
    let page = clamp_page(query.page);
    let limit = clamp_limit(query.limit);
    let offset = (page - 1) * limit;

    let products = Product::find_page(query.category_id, limit, offset, &state.db_pool).await?;
    let total = Product::count_in_category(query.category_id, &state.db_pool).await?;

    let items = products
        .into_iter()
        .map(|p| {
            let staleness = classify(p.last_scraped_at, state.ttls.product);
            to_response(p, Some(staleness))
        })
        .collect();

    Ok(Json(Paginated::new(items, total, page, limit)))
}

/// GET /api/products/:id
pub async fn get_product(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let product = Product::find_by_id(id, &state.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {} not found", id)))?;

    let detail = ProductDetail::find_by_product(id, &state.db_pool).await?;
    let staleness = classify(product.last_scraped_at, state.ttls.product_detail);

    // Only refresh details we have seen at least once; a product without a
    // detail row gets its first detail scrape from the manual refresh path.
    if staleness.needs_refresh() && detail.is_some() {
        if let Err(e) = state.scrape.enqueue_product_detail(id).await {
            warn!(product_id = id, error = %e, "failed to enqueue product detail refresh");
        }
    }

    let reviews = Review::find_recent_for_product(id, REVIEWS_SHOWN, &state.db_pool).await?;

    let recommendations = match product.category_id {
        Some(category_id) => {
            Product::find_recommendations(category_id, id, RECOMMENDATIONS_SHOWN, &state.db_pool)
                .await?
        }
        None => Vec::new(),
    };

    let detail = detail
        .map(|d| ProductDetailFields {
            description: d.description,
            isbn: d.isbn,
            publisher: d.publisher,
            publication_date: d.publication_date,
            pages: d.pages,
            specs: d.specs,
            ratings_avg: d.ratings_avg,
            reviews_count: d.reviews_count,
        })
        .unwrap_or_else(|| ProductDetailFields {
            description: None,
            isbn: None,
            publisher: None,
            publication_date: None,
            pages: None,
            specs: None,
            ratings_avg: None,
            reviews_count: 0,
        });

    Ok(Json(ProductDetailResponse {
        product: to_response(product, None),
        detail,
        reviews: reviews
            .into_iter()
            .map(|r| ReviewResponse {
                id: r.id,
                author: r.author,
                rating: r.rating,
                text: r.text,
            })
            .collect(),
        recommendations: recommendations
            .into_iter()
            .map(|p| to_response(p, None))
            .collect(),
        staleness,
    }))
}

fn to_response(product: Product, staleness: Option<Freshness>) -> ProductResponse {
    ProductResponse {
        id: product.id,
        source_id: product.source_id,
        source_url: product.source_url,
        title: product.title,
        author: product.author,
        price: product.price,
        currency: product.currency,
        image_url: product.image_url,
        category_id: product.category_id,
        last_scraped_at: product.last_scraped_at,
        created_at: product.created_at,
        staleness,
    }
}
