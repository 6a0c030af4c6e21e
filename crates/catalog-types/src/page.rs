//! Offset pagination for list queries.

use serde::{Deserialize, Serialize};

/// Which slice of a listing the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Clamp the request to the configured bounds.
    ///
    /// A zero limit falls back to `default_limit`; anything above
    /// `max_limit` is capped.
    pub fn clamped(self, default_limit: u64, max_limit: u64) -> Self {
        let limit = match self.limit {
            0 => default_limit,
            l => l,
        };
        Self {
            offset: self.offset,
            limit: limit.min(max_limit).max(1),
        }
    }
}

/// One slice of a listing plus the total element count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: u64,
    pub limit: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            offset: request.offset,
            limit: request.limit,
            total,
        }
    }

    /// Transform every item, keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            offset: self.offset,
            limit: self.limit,
            total: self.total,
        }
    }

    pub fn has_next(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.offset > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_uses_default_for_zero_limit() {
        let req = PageRequest::new(5, 0).clamped(20, 100);
        assert_eq!(req, PageRequest::new(5, 20));
    }

    #[test]
    fn test_clamped_caps_large_limit() {
        let req = PageRequest::new(0, 10_000).clamped(20, 100);
        assert_eq!(req.limit, 100);
    }

    #[test]
    fn test_page_navigation_flags() {
        let page = Page::new(vec![1, 2], PageRequest::new(0, 2), 5);
        assert!(page.has_next());
        assert!(!page.has_prev());

        let last = Page::new(vec![5], PageRequest::new(4, 2), 5);
        assert!(!last.has_next());
        assert!(last.has_prev());
    }

    #[test]
    fn test_map_keeps_paging() {
        let page = Page::new(vec![1, 2], PageRequest::new(2, 2), 4).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.offset, 2);
        assert_eq!(page.total, 4);
    }
}
