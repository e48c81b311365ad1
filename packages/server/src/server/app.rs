//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::jobs::ScrapeService;
use crate::kernel::TtlConfig;
use crate::server::routes::{
    get_category, get_job_status, get_navigation, get_product, get_session_history,
    health_handler, list_categories, list_navigation, list_products, track_view, trigger_refresh,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub scrape: Arc<ScrapeService>,
    pub ttls: TtlConfig,
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, config: &Config) -> Router {
    let state = AppState {
        db_pool: pool.clone(),
        scrape: Arc::new(ScrapeService::new(pool, config.scrape_target_url.clone())),
        ttls: TtlConfig::from_config(config),
    };

    let cors = build_cors(&config.allowed_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/navigation", get(list_navigation))
        .route("/api/navigation/:id", get(get_navigation))
        .route("/api/categories/:navigation_id", get(list_categories))
        .route("/api/categories/detail/:id", get(get_category))
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
        .route("/api/scrape/refresh", post(trigger_refresh))
        .route("/api/scrape/job/:job_id", get(get_job_status))
        .route("/api/history/track", post(track_view))
        .route("/api/history/session/:session_id", get(get_session_history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST];

    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(Any)
}
