use serde::{Deserialize, Serialize};

use crate::db_types::Order;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A request for a single page of results. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Page 0 is treated as page 1, and the page size is forced into `1..=max_page_size`.
    pub fn clamped(self, max_page_size: u32) -> Self {
        let max = max_page_size.max(1);
        Self { page: self.page.max(1), page_size: self.page_size.clamp(1, max) }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: i64) -> Self {
        let size = i64::from(request.page_size.max(1));
        let total_pages = (total_items + size - 1) / size;
        Self { page: request.page, page_size: request.page_size, total_items, total_pages }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}
