use thiserror::Error;

/// Errors raised by the scrape orchestration subsystem.
///
/// `NotFound` and `InvalidTarget` are enqueue-time errors surfaced to the
/// caller. `Fetch`, `Parse`, and `Database` are recoverable at the job level
/// and drive the RETRY transition up to the retry cap.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid scrape target: {0}")]
    InvalidTarget(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ScrapeError {
    /// Whether a failed job attempt should re-enter the runnable pool.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScrapeError::Fetch(_)
                | ScrapeError::Parse(_)
                | ScrapeError::Database(_)
                | ScrapeError::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_parse_errors_are_recoverable() {
        assert!(ScrapeError::Fetch("timeout".into()).is_recoverable());
        assert!(ScrapeError::Parse("no records".into()).is_recoverable());
    }

    #[test]
    fn caller_errors_are_not_recoverable() {
        assert!(!ScrapeError::NotFound("product 9".into()).is_recoverable());
        assert!(!ScrapeError::InvalidTarget("productId required".into()).is_recoverable());
    }
}
