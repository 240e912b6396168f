//! Property schema entries and the process-wide schema cache

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::ResourceType;

/// One entry of `GET /crm/v3/properties/{type}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hubspot_defined: bool,
    #[serde(default)]
    pub calculated: bool,
    #[serde(default)]
    pub options: Vec<PropertyOption>,
    #[serde(default)]
    pub modification_metadata: Option<ModificationMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOption {
    pub label: String,
    pub value: Value,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationMetadata {
    #[serde(default)]
    pub read_only_value: bool,
    #[serde(default)]
    pub read_only_definition: bool,
    #[serde(default)]
    pub archivable: bool,
}

impl Property {
    pub fn is_custom(&self) -> bool {
        !self.hubspot_defined
    }

    pub fn is_read_only(&self) -> bool {
        self.modification_metadata
            .as_ref()
            .is_some_and(|meta| meta.read_only_value)
    }

    pub fn is_updatable(&self) -> bool {
        !self.is_read_only()
    }

    /// Description when present and non-empty, else the label
    pub fn summary(&self) -> String {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.label.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

/// Schema cache keyed by resource type, shared by every repository of a `Crm`
#[derive(Debug, Clone, Default)]
pub struct PropertyCache {
    entries: Arc<RwLock<HashMap<ResourceType, Arc<Vec<Property>>>>>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: ResourceType) -> Option<Arc<Vec<Property>>> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&resource).cloned())
    }

    pub fn insert(&self, resource: ResourceType, properties: Vec<Property>) -> Arc<Vec<Property>> {
        let properties = Arc::new(properties);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(resource, Arc::clone(&properties));
        }
        properties
    }

    /// Drop one type's schema so the next lookup refetches it
    pub fn invalidate(&self, resource: ResourceType) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(&resource);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn is_cached(&self, resource: ResourceType) -> bool {
        self.get(resource).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Property> {
        serde_json::from_value(json!([
            {
                "name": "email",
                "label": "Email",
                "type": "string",
                "fieldType": "text",
                "groupName": "contactinformation",
                "description": "A contact's email address",
                "hubspotDefined": true,
                "modificationMetadata": {"readOnlyValue": false, "readOnlyDefinition": true, "archivable": false}
            },
            {
                "name": "favourite_colour",
                "label": "Favourite colour",
                "type": "enumeration",
                "fieldType": "select",
                "description": "",
                "options": [{"label": "Red", "value": "red"}]
            },
            {
                "name": "hs_object_id",
                "label": "Record ID",
                "hubspotDefined": true,
                "modificationMetadata": {"readOnlyValue": true}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_property_flags() {
        let properties = sample();

        assert!(!properties[0].is_custom());
        assert!(properties[0].is_updatable());
        assert!(properties[1].is_custom());
        assert!(properties[2].is_read_only());
        assert_eq!(properties[1].options[0].value, json!("red"));
    }

    #[test]
    fn test_summary_falls_back_to_label() {
        let properties = sample();
        assert_eq!(properties[0].summary(), "A contact's email address");
        assert_eq!(properties[1].summary(), "Favourite colour");
    }

    #[test]
    fn test_cache_invalidation() {
        let cache = PropertyCache::new();
        cache.insert(ResourceType::Contact, sample());
        cache.insert(ResourceType::Company, Vec::new());

        assert!(cache.is_cached(ResourceType::Contact));
        cache.invalidate(ResourceType::Contact);
        assert!(!cache.is_cached(ResourceType::Contact));
        assert!(cache.is_cached(ResourceType::Company));

        cache.clear();
        assert!(!cache.is_cached(ResourceType::Company));
    }

    #[test]
    fn test_cache_is_shared_between_clones() {
        let cache = PropertyCache::new();
        let other = cache.clone();
        other.insert(ResourceType::User, sample());
        assert_eq!(cache.get(ResourceType::User).map(|p| p.len()), Some(3));
    }
}
