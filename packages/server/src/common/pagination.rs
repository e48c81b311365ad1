//! Page/limit pagination envelope for REST list responses.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A page of results plus the counts the grid UI needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Normalize a requested page number (1-based).
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.filter(|p| *p >= 1).unwrap_or(1)
}

/// Normalize a requested page size.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginated::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn total_pages_zero_when_empty() {
        let page: Paginated<i64> = Paginated::new(vec![], 0, 1, 20);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn clamp_page_rejects_non_positive() {
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(Some(4)), 4);
        assert_eq!(clamp_page(None), 1);
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(Some(1000)), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(0)), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
    }
}
