//! Client for the HubSpot CRM v3 API
//!
//! Records with change tracking, lazy paged collections over list, search and
//! batch-read endpoints, and a batch engine that reconciles bulk results back
//! onto local records.

pub mod api;
pub mod batch;
pub mod config;
pub mod paging;
pub mod resource;
pub mod values;

pub use api::{ApiClient, ApiRequest, ApiResponse, Crm, CrmError, Filter, FilterGroup, HttpGateway, Operator, Result, SearchQuery};
pub use batch::{Batch, BatchAction, BatchResponse, Matcher};
pub use config::Config;
pub use paging::{PageItem, PagedBatch, PagedCollection};
pub use resource::{Property, PropertyCache, Record, RecordId, ResourceRepository, ResourceType};
