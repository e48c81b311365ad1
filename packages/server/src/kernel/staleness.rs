//! Freshness classification for mirrored entities.
//!
//! The read API classifies every entity it returns and enqueues a refresh
//! for anything that is not fresh; the distinction between `Stale` and
//! `Missing` is only surfaced to clients.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::Config;

/// Freshness of a mirrored entity relative to its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}

impl Freshness {
    /// Both stale and never-scraped entities trigger a refresh enqueue.
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

impl std::fmt::Display for Freshness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Freshness::Fresh => write!(f, "fresh"),
            Freshness::Stale => write!(f, "stale"),
            Freshness::Missing => write!(f, "missing"),
        }
    }
}

/// Classify a `last_scraped_at` timestamp against a TTL at an explicit
/// point in time. Pure and total.
pub fn classify_at(
    now: DateTime<Utc>,
    last_scraped_at: Option<DateTime<Utc>>,
    ttl: Duration,
) -> Freshness {
    match last_scraped_at {
        None => Freshness::Missing,
        Some(t) if now - t > ttl => Freshness::Stale,
        Some(_) => Freshness::Fresh,
    }
}

/// Classify against the current wall clock.
pub fn classify(last_scraped_at: Option<DateTime<Utc>>, ttl: Duration) -> Freshness {
    classify_at(Utc::now(), last_scraped_at, ttl)
}

/// Per-entity-kind TTLs, configured in hours.
#[derive(Debug, Clone, Copy)]
pub struct TtlConfig {
    pub navigation: Duration,
    pub category: Duration,
    pub product: Duration,
    pub product_detail: Duration,
}

impl TtlConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            navigation: Duration::hours(config.ttl_navigation_hours),
            category: Duration::hours(config.ttl_category_hours),
            product: Duration::hours(config.ttl_product_hours),
            product_detail: Duration::hours(config.ttl_product_detail_hours),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn never_scraped_is_missing_for_any_ttl() {
        for hours in [0, 1, 24, 24 * 365] {
            assert_eq!(
                classify_at(now(), None, Duration::hours(hours)),
                Freshness::Missing
            );
        }
    }

    #[test]
    fn just_scraped_is_fresh_for_any_positive_ttl() {
        for hours in [1, 7, 24] {
            assert_eq!(
                classify_at(now(), Some(now()), Duration::hours(hours)),
                Freshness::Fresh
            );
        }
    }

    #[test]
    fn older_than_ttl_is_stale() {
        let ttl = Duration::hours(24);
        let last = now() - ttl - Duration::seconds(1);
        assert_eq!(classify_at(now(), Some(last), ttl), Freshness::Stale);
    }

    #[test]
    fn exactly_at_ttl_is_still_fresh() {
        let ttl = Duration::hours(24);
        let last = now() - ttl;
        assert_eq!(classify_at(now(), Some(last), ttl), Freshness::Fresh);
    }

    #[test]
    fn twenty_five_hours_old_with_daily_ttl_is_stale() {
        let last = now() - Duration::hours(25);
        assert_eq!(
            classify_at(now(), Some(last), Duration::hours(24)),
            Freshness::Stale
        );
    }

    #[test]
    fn stale_and_missing_need_refresh() {
        assert!(!Freshness::Fresh.needs_refresh());
        assert!(Freshness::Stale.needs_refresh());
        assert!(Freshness::Missing.needs_refresh());
    }
}
