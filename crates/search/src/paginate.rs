//! Page slicing.
//!
//! Pages are 1-based. Anything out of range yields an empty page rather than
//! an error.

use serde::Serialize;

/// Items on 1-based `page` of `size` items each.
///
/// ```
/// use pawfinder_search::paginate;
///
/// let items = [1, 2, 3, 4, 5];
/// assert_eq!(paginate(&items, 2, 2), &[3, 4]);
/// assert_eq!(paginate(&items, 3, 2), &[5]);
/// assert!(paginate(&items, 0, 2).is_empty());
/// ```
pub fn paginate<T>(items: &[T], page: usize, size: usize) -> &[T] {
    if page == 0 || size == 0 {
        return &[];
    }
    let Some(start) = (page - 1).checked_mul(size) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` items; zero items or zero size is zero pages.
pub fn total_pages(total: usize, size: usize) -> usize {
    if size == 0 {
        0
    } else {
        total.div_ceil(size)
    }
}

/// One page plus the numbers a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number requested
    pub page: usize,
    /// Page size requested
    pub page_size: usize,
    /// Items across all pages
    pub total_items: usize,
    /// Number of pages
    pub total_pages: usize,
    /// A later page exists
    pub has_next: bool,
    /// An earlier page exists
    pub has_prev: bool,
}

impl<T: Clone> Page<T> {
    /// Slice `items` into page `page`.
    pub fn of(items: &[T], page: usize, page_size: usize) -> Self {
        let total_pages = total_pages(items.len(), page_size);
        Self {
            items: paginate(items, page, page_size).to_vec(),
            page,
            page_size,
            total_items: items.len(),
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1 && total_pages > 0,
        }
    }
}

impl<T> Page<T> {
    /// Whether this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the pager numbers.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}
