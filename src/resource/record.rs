//! Dynamic-attribute record with change tracking
//!
//! A record keeps the last-known server values in `properties` and local,
//! not-yet-saved edits in `changes`. Reads see `changes` first. Writing a field
//! back to its last-known value drops the pending change.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::{Map, Value, json};

use super::kind::ResourceType;
use crate::api::error::{CrmError, Result};
use crate::api::manager::Crm;

/// Remote identifier: numeric for CRM objects, opaque text for forms
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RecordId::Int(id) => Some(*id),
            RecordId::Text(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(id) => Value::from(*id),
            RecordId::Text(id) => Value::String(id.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{}", id),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Int(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    resource: ResourceType,
    id: Option<RecordId>,
    properties: Map<String, Value>,
    changes: Map<String, Value>,
    metadata: Map<String, Value>,
}

impl Record {
    /// A record built from caller attributes. Every attribute is a pending
    /// change; an `id` attribute marks the record as already persisted.
    pub fn new(resource: ResourceType, mut attributes: Map<String, Value>) -> Self {
        let id = attributes
            .remove("id")
            .and_then(|raw| resource.id_from_value(&raw));

        Self {
            resource,
            id,
            properties: Map::new(),
            changes: attributes,
            metadata: Map::new(),
        }
    }

    pub fn empty(resource: ResourceType) -> Self {
        Self::new(resource, Map::new())
    }

    /// A record built from an API payload: no pending changes, fields routed
    /// to properties or metadata by the resource type.
    pub fn from_payload(resource: ResourceType, mut data: Map<String, Value>) -> Self {
        let id = data.remove("id").and_then(|raw| resource.id_from_value(&raw));
        let mut properties = Map::new();
        let mut metadata = Map::new();

        if resource == ResourceType::Form {
            for (key, value) in data {
                if resource.is_metadata_field(&key) {
                    metadata.insert(key, value);
                } else {
                    properties.insert(key, value);
                }
            }
        } else {
            let payload_properties = match data.remove("properties") {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };

            for (key, value) in payload_properties {
                if resource.is_metadata_field(&key) {
                    metadata.insert(key, value);
                } else {
                    properties.insert(key, value);
                }
            }

            // createdAt, updatedAt, archived and friends
            metadata.extend(data);
        }

        Self {
            resource,
            id,
            properties,
            changes: Map::new(),
            metadata,
        }
    }

    /// Pick `from_payload` or `new` depending on the shape of `data`
    pub fn from_value(resource: ResourceType, data: Value) -> Result<Self> {
        match data {
            Value::Object(map) if resource.is_api_formed(&map) => Ok(Self::from_payload(resource, map)),
            Value::Object(map) => Ok(Self::new(resource, map)),
            other => Err(CrmError::argument(format!(
                "cannot build a {} record from {}",
                resource.simple_name(),
                other
            ))),
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn resource_name(&self) -> String {
        self.resource.name()
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn changes(&self) -> &Map<String, Value> {
        &self.changes
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Current value of a field: the pending change if any, else the last-known value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.changes.get(name).or_else(|| self.properties.get(name))
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Record a local edit. Setting a field to its last-known value removes
    /// the pending change instead.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        let current = self.properties.get(&name).unwrap_or(&Value::Null);

        if *current != value {
            self.changes.insert(name, value);
        } else {
            self.changes.remove(&name);
        }
    }

    /// Whether `name` (or its setter form `name=`) is a known field
    pub fn responds_to(&self, name: &str) -> bool {
        let name = name.strip_suffix('=').unwrap_or(name);
        self.properties.contains_key(name) || self.changes.contains_key(name)
    }

    /// Replace all pending changes at once
    pub fn set_changes(&mut self, changes: Map<String, Value>) {
        self.changes = changes;
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Apply each attribute as a local edit, without saving
    pub fn update_attributes(&mut self, attributes: Value) -> Result<()> {
        let Value::Object(attributes) = attributes else {
            return Err(CrmError::argument("attributes must be a map of field names to values"));
        };

        for (name, value) in attributes {
            self.set(name, value);
        }

        Ok(())
    }

    /// Move a confirmed server value into properties and drop the pending change
    pub(crate) fn commit_change(&mut self, key: &str, value: Value) {
        if self.changes.remove(key).is_some() {
            self.properties.insert(key.to_string(), value);
        }
    }

    fn commit_all_changes(&mut self) {
        let changes = std::mem::take(&mut self.changes);
        self.properties.extend(changes);
    }

    /// The value the remote system would identify this record by
    pub fn identifier(&self, id_property: &str) -> Option<Value> {
        if id_property == "id" {
            self.id.as_ref().map(RecordId::to_value)
        } else {
            self.get(id_property).cloned()
        }
    }

    /// `{id, properties, metadata}` with pending changes folded into properties
    pub fn to_json(&self) -> Value {
        let mut properties = self.properties.clone();
        properties.extend(self.changes.clone());

        json!({
            "id": self.id.as_ref().map(RecordId::to_value),
            "properties": properties,
            "metadata": self.metadata,
        })
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn first_name(&self) -> Option<&str> {
        self.get_str(match self.resource {
            ResourceType::User => "hs_given_name",
            _ => "firstname",
        })
    }

    pub fn last_name(&self) -> Option<&str> {
        self.get_str(match self.resource {
            ResourceType::User => "hs_family_name",
            _ => "lastname",
        })
    }

    pub fn email(&self) -> Option<&str> {
        self.get_str(match self.resource {
            ResourceType::User => "hs_email",
            _ => "email",
        })
    }

    /// Persist pending changes.
    ///
    /// A persisted record PATCHes its changes; a rejected update yields
    /// `Ok(false)` and leaves the record untouched. A new record is created and
    /// picks up the assigned id; create failures are returned as errors.
    pub async fn save(&mut self, crm: &Crm) -> Result<bool> {
        let repository = crm.resource(self.resource);

        match &self.id {
            Some(id) => match repository.update(id, &self.changes).await {
                Ok(true) => {
                    self.commit_all_changes();
                    Ok(true)
                }
                Ok(false) => Ok(false),
                Err(err) => {
                    warn!("Failed to save {} {}: {}", self.resource.name(), id, err);
                    Ok(false)
                }
            },
            None => {
                let created = repository.create(self.changes.clone()).await?;
                self.id = created.id.clone();
                if self.id.is_some() {
                    debug!("Created {} {:?}", self.resource.name(), self.id);
                    self.commit_all_changes();
                    self.metadata.extend(created.metadata);
                }
                Ok(self.id.is_some())
            }
        }
    }

    /// Like `save`, but refuses to run without pending changes
    pub async fn save_strict(&mut self, crm: &Crm) -> Result<bool> {
        if !self.has_changes() {
            return Err(CrmError::NothingToDo);
        }

        self.save(crm).await
    }

    /// Apply `attributes` and save; only valid for persisted records
    pub async fn update(&mut self, crm: &Crm, attributes: Value) -> Result<bool> {
        if !self.is_persisted() {
            return Err(CrmError::argument("not able to update as not persisted"));
        }

        self.update_attributes(attributes)?;
        self.save(crm).await
    }

    /// Archive the remote object. The local record stays as it is.
    pub async fn archive(&self, crm: &Crm) -> Result<bool> {
        let id = self
            .id
            .as_ref()
            .ok_or_else(|| CrmError::argument("not able to archive as not persisted"))?;

        crm.resource(self.resource).archive(id).await
    }
}
