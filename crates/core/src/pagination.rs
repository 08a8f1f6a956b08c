//! Page envelope and pagination maths.

use serde::{Deserialize, Serialize};

/// Default page size for camera listings.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page size sent to the remote service in one request.
pub const MAX_REMOTE_PAGE_SIZE: u64 = 100;

/// Standard `{items, total, page, size, pages}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    /// Build an envelope whose `total` and `pages` are derived from `items`.
    pub fn from_items(items: Vec<T>, page: u64, size: u64) -> Self {
        let total = items.len() as u64;
        Self {
            items,
            total,
            page,
            size,
            pages: page_count(total, size),
        }
    }
}

/// `ceil(total / size)`, never less than 1. A zero size counts as 1.
pub fn page_count(total: u64, size: u64) -> u64 {
    total.div_ceil(size.max(1)).max(1)
}

/// Clamp a 1-based page number to at least 1.
pub fn clamp_page(page: u64) -> u64 {
    page.max(1)
}

/// Clamp a page size to at least 1. There is no upper bound: `pages` is
/// always derived from the size the caller asked for.
pub fn clamp_size(size: u64) -> u64 {
    size.max(1)
}

/// Page size for a remote list request, capped at [`MAX_REMOTE_PAGE_SIZE`].
pub fn remote_page_size(size: u64) -> u64 {
    size.clamp(1, MAX_REMOTE_PAGE_SIZE)
}

/// Slice the 1-based `page` window out of `items`.
pub fn page_window<T>(items: Vec<T>, page: u64, size: u64) -> Vec<T> {
    let size = size.max(1) as usize;
    let start = (clamp_page(page) as usize - 1).saturating_mul(size);
    items.into_iter().skip(start).take(size).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_at_least_one_for_empty_set() {
        assert_eq!(page_count(0, 10), 1);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 7), 4);
    }

    #[test]
    fn page_count_matches_ceil_for_many_inputs() {
        for total in 0..50u64 {
            for size in 1..12u64 {
                let expected = ((total as f64) / (size as f64)).ceil().max(1.0) as u64;
                assert_eq!(page_count(total, size), expected, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn zero_size_is_treated_as_one() {
        assert_eq!(page_count(3, 0), 3);
    }

    #[test]
    fn clamp_size_only_raises_zero() {
        assert_eq!(clamp_size(0), 1);
        assert_eq!(clamp_size(20), 20);
        assert_eq!(clamp_size(500), 500);
    }

    #[test]
    fn remote_page_size_is_capped() {
        assert_eq!(remote_page_size(0), 1);
        assert_eq!(remote_page_size(20), 20);
        assert_eq!(remote_page_size(500), MAX_REMOTE_PAGE_SIZE);
    }

    #[test]
    fn page_window_slices_requested_page() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(page_window(items.clone(), 1, 10), (1..=10).collect::<Vec<_>>());
        assert_eq!(page_window(items.clone(), 3, 10), (21..=25).collect::<Vec<_>>());
        assert!(page_window(items, 4, 10).is_empty());
    }

    #[test]
    fn from_items_derives_total_and_pages() {
        let page = Page::from_items(vec!["a", "b", "c"], 1, 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
    }
}
