//! Catalog search and paging.
//!
//! Results are always ordered by ascending item id so pages are stable. A
//! query with no matches yields an empty page, never an error.

use serde::{Deserialize, Serialize};

use crate::item::Item;

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const DEFAULT_FEATURED_PAGE_SIZE: u32 = 4;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Optional filters. Empty or blank strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl SearchQuery {
    pub fn new(category: Option<String>, q: Option<String>) -> Self {
        Self { category, q }
    }

    pub fn category_filter(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn text_filter(&self) -> Option<&str> {
        non_blank(self.q.as_deref())
    }

    pub fn matches(&self, item: &Item) -> bool {
        let category_ok = self.category_filter().is_none_or(|c| item.in_category(c));
        let text_ok = self.text_filter().is_none_or(|q| item.matches_text(q));
        category_ok && text_ok
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// 0-based page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Build a page request, clamping the size into `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn featured() -> Self {
        Self::new(0, DEFAULT_FEATURED_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the totals needed for navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from an already-sliced result set.
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let size = u64::from(request.size);
        Self {
            items,
            page: request.page,
            size: request.size,
            total_items,
            total_pages: total_items.div_ceil(size),
        }
    }

    /// Slice an ordered, fully materialized result set.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
