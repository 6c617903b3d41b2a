//! Catalog domain module.
//!
//! Items, the stock sufficiency rule, and the search/paging model. Pure domain
//! logic; storage lives in `billing-infra`.

pub mod item;
pub mod search;

pub use item::{Item, NewItem};
pub use search::{
    DEFAULT_FEATURED_PAGE_SIZE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest, SearchQuery,
};
