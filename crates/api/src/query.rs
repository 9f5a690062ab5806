//! Shared query parameter types for API handlers.

use leadbid_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)` pair for repository calls.
    pub fn resolve(&self) -> (i64, i64) {
        (
            clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            clamp_offset(self.offset),
        )
    }
}
