use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Position within a view of `len` records split into fixed-size pages.
/// The page number is 1-based and always within `1..=page_count()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
    len: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    /// Starts at page 1. A zero `page_size` is treated as 1.
    pub fn new(len: usize, page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            len,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Never less than 1, even for an empty view.
    pub fn page_count(&self) -> usize {
        self.len.div_ceil(self.page_size).max(1)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Positions in the view covered by the current page.
    pub fn range(&self) -> Range<usize> {
        let start = (self.page - 1) * self.page_size;
        start.min(self.len)..(start + self.page_size).min(self.len)
    }

    /// Returns whether the page changed.
    pub fn next(&mut self) -> bool {
        self.go_to(self.page + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.page > 1 && self.go_to(self.page - 1)
    }

    /// Moves to `page` if it is valid; anything else leaves the pager as is.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page == self.page || page == 0 || page > self.page_count() {
            return false;
        }
        self.page = page;
        true
    }

    /// Back to page 1 over a view of `len` records.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.page = 1;
    }

    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page, self.page_count())
    }
}
