// Background scrape worker entry point. Run alongside the API server;
// the two share only the database.

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::kernel::jobs::{ScrapeWorker, WorkerConfig};
use server_core::kernel::scrapers::HttpFetcher;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scrape worker");

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let fetcher = Arc::new(HttpFetcher::new().context("Failed to create fetcher")?);
    let worker = ScrapeWorker::new(pool, fetcher, WorkerConfig::from_config(&config));

    // Graceful shutdown on Ctrl-C
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    worker.run(shutdown).await
}
