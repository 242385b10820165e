//! Page arithmetic shared by the store and the API.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A resolved page request. `page` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    /// Resolve optional query values. Page 0 becomes 1; limit is clamped.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    pub fn limit(&self) -> usize {
        self.limit as usize
    }

    pub fn page_info(&self, total: u64) -> PageInfo {
        PageInfo {
            current: self.page,
            pages: total.div_ceil(u64::from(self.limit)),
            total,
        }
    }
}

/// Pagination block returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PageInfo {
    pub current: u32,
    pub pages: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::from_query(None, None);
        assert_eq!(p, Pagination { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_limit_clamped_and_page_floor() {
        assert_eq!(Pagination::from_query(Some(0), Some(0)), Pagination { page: 1, limit: 1 });
        assert_eq!(Pagination::from_query(Some(3), Some(1000)).limit, MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_offset_and_pages() {
        let p = Pagination::from_query(Some(3), Some(10));
        assert_eq!(p.offset(), 20);
        assert_eq!(p.page_info(21), PageInfo { current: 3, pages: 3, total: 21 });
        assert_eq!(p.page_info(0).pages, 0);
        assert_eq!(p.page_info(30).pages, 3);
    }
}
