//! Pagination over ordered collections
//!
//! [`paginate`] slices a full list into numbered pages. [`InfiniteScroll`]
//! builds on it for incremental loading: each "next page" request appends
//! the records it has not seen yet to a growing list.

mod scroll;

pub use scroll::{FetchError, InfiniteScroll, LoadOutcome, PageSource};

use serde::{Deserialize, Serialize};

/// Records addressed by a unique identifier
pub trait Identified {
    fn id(&self) -> &str;
}

/// One page of an ordered collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    /// Size of the whole collection
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl<T> Paginated<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
            has_more: self.has_more,
        }
    }
}

/// Number of pages needed for `total` items
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Slice page `page` (1-based) out of `items`.
///
/// Page 0 is read as page 1 and a zero page size as 1. A page past the end
/// is empty with `has_more == false`.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Paginated<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total_pages(total, page_size);

    let start = (page - 1).saturating_mul(page_size);
    let slice = if start < total {
        let end = start.saturating_add(page_size).min(total);
        items[start..end].to_vec()
    } else {
        Vec::new()
    };

    Paginated {
        items: slice,
        page,
        page_size,
        total,
        total_pages,
        has_more: page < total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let items: Vec<u32> = (1..=23).collect();
        let page = paginate(&items, 1, 10);
        assert_eq!(page.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total, 23);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);

        let short: Vec<u32> = (1..=4).collect();
        let page = paginate(&short, 1, 10);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_sizes_match_ceil() {
        for m in 0..30usize {
            for n in 1..8usize {
                let items: Vec<usize> = (0..m).collect();
                let page = paginate(&items, 1, n);
                assert_eq!(page.items.len(), n.min(m));
                assert_eq!(page.total_pages, (m + n - 1) / n);
            }
        }
    }

    #[test]
    fn test_last_and_beyond() {
        let items: Vec<u32> = (1..=23).collect();
        let last = paginate(&items, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23]);
        assert!(!last.has_more);

        let beyond = paginate(&items, 4, 10);
        assert!(beyond.items.is_empty());
        assert!(!beyond.has_more);
        assert_eq!(beyond.total, 23);

        let far = paginate(&items, usize::MAX, 10);
        assert!(far.items.is_empty());
    }

    #[test]
    fn test_degenerate_arguments() {
        let items = vec!['a', 'b', 'c'];
        assert_eq!(paginate(&items, 0, 2).page, 1);
        assert_eq!(paginate(&items, 1, 0).items, vec!['a']);
        let empty: Vec<char> = Vec::new();
        let page = paginate(&empty, 1, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_more);
    }
}
