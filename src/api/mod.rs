//! HubSpot API transport
//!
//! A reqwest client behind the `HttpGateway` trait, with 429 retry handling,
//! request logging, error mapping and endpoint helpers.

pub mod client;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod manager;
pub mod pluralization;
pub mod query;
pub mod resilience;

pub use client::ApiClient;
pub use error::{CrmError, Result};
pub use gateway::{ApiRequest, ApiResponse, HttpGateway};
pub use manager::Crm;
pub use query::{Filter, FilterGroup, Operator, PageResponse, SearchQuery};
pub use resilience::{ApiLogger, LogLevel, MonitoringConfig, ResilienceConfig, RetryConfig, RetryPolicy, TimeoutConfig};
