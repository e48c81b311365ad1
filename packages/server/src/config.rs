use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// External origin scraped for navigation, category, and product-list targets
    pub scrape_target_url: String,
    pub ttl_navigation_hours: i64,
    pub ttl_category_hours: i64,
    pub ttl_product_hours: i64,
    pub ttl_product_detail_hours: i64,
    /// Jobs claimed per worker poll (batch size, not parallel requests)
    pub job_concurrency: i64,
    pub request_delay_ms: u64,
    pub max_retries: i32,
    pub job_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            scrape_target_url: env::var("SCRAPE_TARGET_URL")
                .context("SCRAPE_TARGET_URL must be set")?,
            ttl_navigation_hours: parse_env("SCRAPE_TTL_NAVIGATION_HOURS", "24")?,
            ttl_category_hours: parse_env("SCRAPE_TTL_CATEGORY_HOURS", "24")?,
            ttl_product_hours: parse_env("SCRAPE_TTL_PRODUCT_HOURS", "7")?,
            ttl_product_detail_hours: parse_env("SCRAPE_TTL_PRODUCT_DETAIL_HOURS", "7")?,
            job_concurrency: parse_env("SCRAPE_JOB_CONCURRENCY", "2")?,
            request_delay_ms: parse_env("SCRAPE_REQUEST_DELAY_MS", "2000")?,
            max_retries: parse_env("SCRAPE_MAX_RETRIES", "3")?,
            job_timeout_secs: parse_env("SCRAPE_JOB_TIMEOUT_SECS", "60")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

fn parse_env<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} must be a valid number", key))
}
