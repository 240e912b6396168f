//! Search input accepted by `search` and `total`

use serde_json::{Map, Value};

use super::filters::FilterGroup;
use crate::api::error::{CrmError, Result};

/// Either a full-text query or one AND-combined filter group
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Text(String),
    Filters(FilterGroup),
}

impl SearchQuery {
    /// Accept a JSON string (full-text) or object (suffix-style filters).
    /// Anything else is rejected before a request is built.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(text) => Ok(SearchQuery::Text(text)),
            Value::Object(conditions) => Ok(SearchQuery::Filters(FilterGroup::from_conditions(conditions))),
            other => Err(CrmError::argument(format!(
                "search query must be a string or a map of filters, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Write `query` or `filterGroups` into a search request body
    pub fn apply_to(&self, body: &mut Map<String, Value>) {
        match self {
            SearchQuery::Text(text) => {
                body.insert("query".to_string(), Value::String(text.clone()));
            }
            SearchQuery::Filters(group) => {
                let group = serde_json::to_value(group).unwrap_or(Value::Null);
                body.insert("filterGroups".to_string(), Value::Array(vec![group]));
            }
        }
    }
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        SearchQuery::Text(text.to_string())
    }
}

impl From<String> for SearchQuery {
    fn from(text: String) -> Self {
        SearchQuery::Text(text)
    }
}

impl From<FilterGroup> for SearchQuery {
    fn from(group: FilterGroup) -> Self {
        SearchQuery::Filters(group)
    }
}

impl TryFrom<Value> for SearchQuery {
    type Error = CrmError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
