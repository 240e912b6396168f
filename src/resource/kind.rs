//! Resource types and their per-type conventions

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::api::constants::{
    CONTACT_BATCH_LIMIT, CRM_OBJECTS_ROOT, DEFAULT_BATCH_LIMIT, MARKETING_ROOT,
};
use crate::api::error::{CrmError, Result};
use crate::api::pluralization::pluralize_resource_name;

use super::record::RecordId;

/// System fields that never count as business data
const METADATA_FIELDS: &[&str] = &[
    "createdate",
    "lastmodifieddate",
    "hs_createdate",
    "hs_lastmodifieddate",
    "hs_object_id",
];

/// Top-level keys of a form payload that are metadata rather than form content
const FORM_METADATA_FIELDS: &[&str] = &["createdAt", "updatedAt", "archived"];

const USER_REQUIRED_PROPERTIES: &[&str] = &["hs_email", "hs_given_name", "hs_family_name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Contact,
    Company,
    Form,
    User,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Contact,
        ResourceType::Company,
        ResourceType::Form,
        ResourceType::User,
    ];

    pub fn simple_name(self) -> &'static str {
        match self {
            ResourceType::Contact => "Contact",
            ResourceType::Company => "Company",
            ResourceType::Form => "Form",
            ResourceType::User => "User",
        }
    }

    /// Endpoint name: `contacts`, `companies`, `forms`, `users`
    pub fn name(self) -> String {
        pluralize_resource_name(self.simple_name())
    }

    pub fn api_root(self) -> &'static str {
        match self {
            ResourceType::Form => MARKETING_ROOT,
            _ => CRM_OBJECTS_ROOT,
        }
    }

    /// Whether a property key belongs in metadata instead of properties
    pub fn is_metadata_field(self, key: &str) -> bool {
        match self {
            ResourceType::Contact => METADATA_FIELDS.contains(&key) || key.starts_with("hs_"),
            ResourceType::Form => FORM_METADATA_FIELDS.contains(&key),
            _ => METADATA_FIELDS.contains(&key),
        }
    }

    /// Properties merged into every find, search and batch read
    pub fn always_fetch(self) -> &'static [&'static str] {
        match self {
            ResourceType::User => USER_REQUIRED_PROPERTIES,
            _ => &[],
        }
    }

    /// Max inputs per batch write call
    pub fn batch_limit(self) -> usize {
        match self {
            ResourceType::Contact => CONTACT_BATCH_LIMIT,
            _ => DEFAULT_BATCH_LIMIT,
        }
    }

    /// Forms keep their opaque string ids; everything else is numeric
    pub fn uses_text_ids(self) -> bool {
        self == ResourceType::Form
    }

    /// Parse a caller-supplied id the way this type's payloads carry it
    pub fn parse_id(self, raw: &str) -> Result<RecordId> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CrmError::argument("id must not be blank"));
        }

        if self.uses_text_ids() {
            return Ok(RecordId::Text(raw.to_string()));
        }

        raw.parse::<i64>()
            .map(RecordId::Int)
            .map_err(|_| CrmError::argument(format!("{} ids are numeric, got '{}'", self.simple_name(), raw)))
    }

    /// Read an id out of a payload value, honouring the type's id style
    pub fn id_from_value(self, value: &Value) -> Option<RecordId> {
        match value {
            Value::Null => None,
            Value::String(s) if self.uses_text_ids() => Some(RecordId::Text(s.clone())),
            Value::Number(n) if self.uses_text_ids() => Some(RecordId::Text(n.to_string())),
            other => crate::values::as_integer_id(other).map(RecordId::Int),
        }
    }

    /// A payload that came from the API rather than from caller attributes
    pub fn is_api_formed(self, data: &serde_json::Map<String, Value>) -> bool {
        if data.get("properties").is_some_and(Value::is_object) {
            return true;
        }

        self == ResourceType::Form
            && (data.get("fieldGroups").is_some_and(Value::is_array)
                || data.get("configuration").is_some_and(Value::is_object))
    }

    /// Requested property list with the always-fetch properties merged in
    pub fn property_list<S: AsRef<str>>(self, requested: &[S]) -> Vec<String> {
        let mut properties: Vec<String> = requested.iter().map(|p| p.as_ref().to_string()).collect();

        for required in self.always_fetch() {
            if !properties.iter().any(|p| p == required) {
                properties.push(required.to_string());
            }
        }

        properties
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ResourceType {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();

        ResourceType::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted || kind.simple_name().to_ascii_lowercase() == wanted)
            .or_else(|| (wanted == "owner" || wanted == "owners").then_some(ResourceType::User))
            .ok_or_else(|| CrmError::argument(format!("unknown resource type '{}'", s)))
    }
}
