use std::ops::Range;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Offset pagination with a 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    items_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl Pagination {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            page: 1,
            items_per_page: items_per_page.max(1),
        }
    }

    /// Requested page, before clamping to the available range.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Changing the page size always returns to page 1.
    pub fn set_items_per_page(&mut self, items_per_page: usize) {
        self.items_per_page = items_per_page.max(1);
        self.page = 1;
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.items_per_page)
    }

    /// Requested page clamped into `1..=max(total_pages, 1)`.
    pub fn current_page(&self, total: usize) -> usize {
        self.page.clamp(1, self.total_pages(total).max(1))
    }

    /// Index range of the current page within a set of `total` items.
    pub fn range(&self, total: usize) -> Range<usize> {
        self.range_for_page(self.current_page(total), total)
    }

    pub fn range_for_page(&self, page: usize, total: usize) -> Range<usize> {
        let start = page
            .saturating_sub(1)
            .saturating_mul(self.items_per_page)
            .min(total);
        let end = start.saturating_add(self.items_per_page).min(total);
        start..end
    }
}
