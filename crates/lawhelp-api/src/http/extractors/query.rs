//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Hard cap on a single page.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Pagination for session and transcript listings.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}

impl PageQuery {
    /// `(limit, offset)` with the limit defaulted and clamped to `1..=MAX_PAGE_SIZE`.
    pub fn resolve(&self, default_limit: i64) -> (Option<i64>, Option<i64>) {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.filter(|o| *o > 0);
        (Some(limit), offset)
    }
}
