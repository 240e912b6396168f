//! Search filter building
//!
//! Turns the suffix grammar used by `search` and `where` (`email_contains`,
//! `age_gte`, `id_in`, ...) into HubSpot filter groups.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::values::is_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    ContainsToken,
    In,
    NotHasProperty,
}

/// Key suffixes and the operator each selects; no suffix means EQ
const OPERATOR_SUFFIXES: &[(&str, Operator)] = &[
    ("_contains", Operator::ContainsToken),
    ("_gte", Operator::Gte),
    ("_lte", Operator::Lte),
    ("_gt", Operator::Gt),
    ("_lt", Operator::Lt),
    ("_neq", Operator::Neq),
    ("_in", Operator::In),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub property_name: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

/// Filters combined with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

impl Filter {
    pub fn new(property_name: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        let (value, values) = match value {
            Some(Value::Array(items)) => (None, Some(items)),
            other => (other, None),
        };

        Self {
            property_name: property_name.into(),
            operator,
            value,
            values,
        }
    }

    pub fn missing(property: impl Into<String>) -> Self {
        Self::new(property, Operator::NotHasProperty, None)
    }

    /// Parse one `key => value` condition.
    ///
    /// A blank value always means NOT_HAS_PROPERTY on the whole key; otherwise
    /// the key suffix picks the operator and is stripped from the property name.
    pub fn parse(key: &str, value: Value) -> Self {
        if is_blank(&value) {
            return Self::missing(key);
        }

        let (property, operator) = split_operator(key);
        Self::new(property, operator, Some(value))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Split `email_contains` into (`email`, CONTAINS_TOKEN)
pub fn split_operator(key: &str) -> (&str, Operator) {
    for (suffix, operator) in OPERATOR_SUFFIXES {
        if let Some(property) = key.strip_suffix(suffix) {
            if !property.is_empty() {
                return (property, *operator);
            }
        }
    }

    (key, Operator::Eq)
}

impl FilterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one AND group from suffix-style conditions
    pub fn from_conditions<I, K, V>(conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut group = Self::new();
        group.extend_conditions(conditions);
        group
    }

    pub fn extend_conditions<I, K, V>(&mut self, conditions: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (key, value) in conditions {
            self.filters.push(Filter::parse(key.as_ref(), value.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }
}
