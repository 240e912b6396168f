//! Search query building and page parsing
//!
//! Filters follow HubSpot's filter-group grammar; pages follow the
//! `results` / `paging.next.after` envelope shared by list and search endpoints.

pub mod filters;
pub mod result;
pub mod search;

pub use filters::{Filter, FilterGroup, Operator};
pub use result::PageResponse;
pub use search::SearchQuery;
