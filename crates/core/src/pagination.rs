//! Page-number pagination over an in-memory sequence.

use serde::Serialize;

/// Root comments shown per page.
pub const COMMENT_PAGE_SIZE: usize = 25;

/// First page number; pages are 1-based.
pub const FIRST_PAGE: u32 = 1;

/// One page of items plus the numbers needed to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

/// `ceil(count / page_size)`; zero items means zero pages.
pub fn total_pages(count: usize, page_size: usize) -> u32 {
    let pages = count.div_ceil(page_size.max(1));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Slice `items` down to the requested 1-based page.
///
/// Out-of-range pages (including 0) produce an empty page rather than an
/// error.
pub fn paginate<T>(items: Vec<T>, page: u32, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);

    let items = if page < FIRST_PAGE || page > total_pages {
        Vec::new()
    } else {
        let start = (page - FIRST_PAGE) as usize * page_size;
        items.into_iter().skip(start).take(page_size).collect()
    };

    Page {
        items,
        page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 25), 0);
        assert_eq!(total_pages(1, 25), 1);
        assert_eq!(total_pages(25, 25), 1);
        assert_eq!(total_pages(26, 25), 2);
        assert_eq!(total_pages(100, 25), 4);
    }

    #[test]
    fn pages_slice_in_order() {
        let items: Vec<u32> = (0..60).collect();
        let second = paginate(items.clone(), 2, 25);
        assert_eq!(second.items, (25..50).collect::<Vec<_>>());
        assert_eq!(second.total_pages, 3);

        let last = paginate(items, 3, 25);
        assert_eq!(last.items, (50..60).collect::<Vec<_>>());
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items: Vec<u32> = (0..10).collect();
        assert!(paginate(items.clone(), 2, 25).items.is_empty());
        assert!(paginate(items.clone(), 0, 25).items.is_empty());

        let page = paginate(items, 99, 25);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 99);
        assert_eq!(page.total_pages, 1);
    }
}
