//! Pagination helpers for listing endpoints
//!
//! Page numbers are 1-based. A page past the end of the collection is a
//! valid, empty page rather than an error, so clients can iterate without
//! probing for the last page first.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by paginated listings
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// Requested page, defaulting to the first
    pub page: Option<u64>,
}

impl PageQuery {
    /// The 1-based page number to serve
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Zero-based page index for the database paginator
    pub fn page_index(&self) -> u64 {
        self.page() - 1
    }
}

/// One page of a listing, with enough shape for clients to render
/// pagination controls
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Assemble a page from fetched items and the collection total
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            total_items.div_ceil(page_size)
        };

        Self {
            has_next: page < total_pages,
            has_previous: page > 1,
            items,
            page,
            page_size,
            total_items,
            total_pages,
        }
    }

    /// Map the items of this page, keeping the paging envelope
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_items_split_ten_three() {
        // First page holds ten records and reports more available
        let first = Page::new(vec![0u32; 10], 1, 10, 13);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        // Second page holds the remaining three
        let second = Page::new(vec![0u32; 3], 2, 10, 13);
        assert_eq!(second.items.len(), 3);
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn test_empty_collection_is_one_empty_page() {
        let page: Page<u32> = Page::new(vec![], 1, 10, 0);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_out_of_range_page_is_empty_not_error() {
        let page: Page<u32> = Page::new(vec![], 5, 10, 13);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 2);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_page_query_defaults_to_first_page() {
        let query = PageQuery { page: None };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_index(), 0);

        let zero = PageQuery { page: Some(0) };
        assert_eq!(zero.page(), 1);
    }

    #[test]
    fn test_map_preserves_envelope() {
        let page = Page::new(vec![1u32, 2, 3], 2, 10, 13);
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1", "2", "3"]);
        assert_eq!(mapped.page, 2);
        assert_eq!(mapped.total_items, 13);
    }
}
