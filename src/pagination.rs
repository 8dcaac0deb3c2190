//! Page arithmetic shared by every list endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Limit used when a caller gives no usable one and the endpoint has no
/// default of its own.
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total_items: u64) -> Self {
        Self::with_default_limit(page, limit, total_items, DEFAULT_LIMIT)
    }

    /// `page < 1` becomes 1 and `limit < 1` becomes `default_limit`.
    /// `total_pages` never drops below 1, even for an empty result.
    pub fn with_default_limit(page: i64, limit: i64, total_items: u64, default_limit: i64) -> Self {
        let page = page.max(1);
        let limit = if limit < 1 { default_limit.max(1) } else { limit };
        let total_pages = total_items.div_ceil(limit as u64).max(1);

        Self {
            page,
            limit,
            total_items,
            total_pages,
        }
    }

    /// Rows to skip. Saturates at the largest OFFSET Postgres accepts.
    pub fn offset(&self) -> u64 {
        ((self.page.max(1) - 1) as u64)
            .saturating_mul(self.limit.max(0) as u64)
            .min(i64::MAX as u64)
    }
}

pub fn paginate(page: i64, limit: i64, total_items: u64) -> Pagination {
    Pagination::new(page, limit, total_items)
}
