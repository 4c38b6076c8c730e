//! Page-number pagination for history endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 50;

/// `page` is 1-based and clamped to at least 1; `limit` is clamped to `1..=50`.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number, starting at 1 (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<i64>,

    /// Items per page (default: 10, max: 50)
    #[param(default = 10, minimum = 1, maximum = 50)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PageQuery {
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip for the current page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// One page of results plus the totals a client needs to render page controls.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    /// Number of items across all pages
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        let limit = query.limit();
        Self {
            items,
            page: query.page(),
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}
