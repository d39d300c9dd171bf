//! Pagination utilities
//!
//! All list endpoints take `page` (1-indexed) and `limit` query parameters.
//! Out-of-range values are clamped rather than rejected.

use serde::{Deserialize, Serialize};

/// Page size when `limit` is omitted
pub const DEFAULT_LIMIT: i64 = 20;
/// Largest page size a client may request
pub const MAX_LIMIT: i64 = 50;

/// Raw `page` / `limit` query values
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Sanitized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page, within [1, MAX_LIMIT]
    pub limit: i64,
}

impl PageRequest {
    /// Clamp requested values: page < 1 becomes 1, limit is forced into [1, 50]
    ///
    /// # Examples
    /// ```
    /// use tutormatch_api::pagination::PageRequest;
    ///
    /// let p = PageRequest::new(Some(0), Some(500));
    /// assert_eq!(p.page, 1);
    /// assert_eq!(p.limit, 50);
    /// assert_eq!(p.offset(), 0);
    /// ```
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Offset for SQL LIMIT/OFFSET query
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(query.page, query.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

/// Pagination metadata returned alongside every list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Calculate pagination metadata from total results and the served request
    ///
    /// A page past the end is reported as requested; its slice is simply empty.
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total_pages = (total + request.limit - 1) / request.limit;
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
        }
    }
}
