//! Strategies for pairing a batch result with the local record it came from

use serde_json::Value;

use crate::resource::Record;
use crate::values::values_match;

/// Decides whether `result` (one item of a batch response) belongs to `record`
pub trait Matcher: Send + Sync {
    fn matches(&self, record: &Record, result: &Value) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&Record, &Value) -> bool + Send + Sync,
{
    fn matches(&self, record: &Record, result: &Value) -> bool {
        self(record, result)
    }
}

/// Created rows: an unsaved record whose every pending change appears in the
/// result's properties with an equal value
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateMatcher;

impl Matcher for CreateMatcher {
    fn matches(&self, record: &Record, result: &Value) -> bool {
        if record.is_persisted() || !record.has_changes() {
            return false;
        }

        let Some(properties) = result.get("properties").and_then(Value::as_object) else {
            return false;
        };

        record
            .changes()
            .iter()
            .all(|(key, value)| properties.get(key).is_some_and(|remote| values_match(value, remote)))
    }
}

/// Updated rows keyed by the remote id
#[derive(Debug, Clone, Copy, Default)]
pub struct IdMatcher;

impl Matcher for IdMatcher {
    fn matches(&self, record: &Record, result: &Value) -> bool {
        let Some(local) = record.id() else {
            return false;
        };

        result
            .get("id")
            .and_then(|raw| record.resource().id_from_value(raw))
            .is_some_and(|remote| &remote == local)
    }
}

/// Updated rows keyed by a unique property such as `email`
#[derive(Debug, Clone)]
pub struct PropertyMatcher {
    property: String,
}

impl PropertyMatcher {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }
}

impl Matcher for PropertyMatcher {
    fn matches(&self, record: &Record, result: &Value) -> bool {
        let Some(remote) = result.get("properties").and_then(|p| p.get(&self.property)) else {
            return false;
        };

        record.get(&self.property).is_some_and(|local| values_match(local, remote))
    }
}
