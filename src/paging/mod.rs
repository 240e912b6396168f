//! Lazy page iteration over list, search and batch-read endpoints

pub mod batch;
pub mod collection;

pub use batch::PagedBatch;
pub use collection::PagedCollection;

use serde_json::Value;

use crate::api::error::{CrmError, Result};
use crate::resource::{Record, ResourceType};

/// Something a page result can be turned into
pub trait PageItem: Sized {
    fn from_result(resource: Option<ResourceType>, result: Value) -> Result<Self>;
}

impl PageItem for Value {
    fn from_result(_resource: Option<ResourceType>, result: Value) -> Result<Self> {
        Ok(result)
    }
}

impl PageItem for Record {
    fn from_result(resource: Option<ResourceType>, result: Value) -> Result<Self> {
        let resource = resource.ok_or_else(|| CrmError::argument("collection has no resource type to build records"))?;
        Record::from_value(resource, result)
    }
}

/// Render a parameter as a query-string value; lists are comma-joined
pub(crate) fn query_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
