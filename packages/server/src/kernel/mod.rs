//! Kernel module - scrape orchestration infrastructure.

pub mod error;
pub mod jobs;
pub mod scrapers;
pub mod staleness;

pub use error::ScrapeError;
pub use staleness::{classify, classify_at, Freshness, TtlConfig};
