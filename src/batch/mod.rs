//! Bulk create, update, upsert and archive
//!
//! A `Batch` holds records of a single resource type. Each write action
//! gathers inputs, sends them in chunks sized by the resource type, then
//! reconciles the returned rows onto the local records.

pub mod matcher;

pub use matcher::{CreateMatcher, IdMatcher, Matcher, PropertyMatcher};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::{Value, json};

use crate::api::constants;
use crate::api::error::{CrmError, Result};
use crate::api::gateway::ApiRequest;
use crate::api::manager::Crm;
use crate::resource::{Record, ResourceType};
use crate::values::is_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Create,
    Update,
    Upsert,
    Archive,
}

impl BatchAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchAction::Create => "create",
            BatchAction::Update => "update",
            BatchAction::Upsert => "upsert",
            BatchAction::Archive => "archive",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chunk's response, status code preserved
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    pub status: u16,
    pub body: Value,
}

impl BatchResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 for updates and reads, 201 for creates, 204 for archives
    pub fn all_successful(&self) -> bool {
        matches!(self.status, 200 | 201 | 204)
    }

    /// Some rows succeeded and some failed (207 Multi-Status)
    pub fn partial_success(&self) -> bool {
        self.status == 207
    }

    pub fn results(&self) -> &[Value] {
        self.body
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Per-row errors reported alongside a partial success
    pub fn errors(&self) -> &[Value] {
        self.body
            .get("errors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub struct Batch {
    resources: Vec<Record>,
    id_property: String,
    matcher: Option<Arc<dyn Matcher>>,
    responses: Vec<BatchResponse>,
    action: Option<BatchAction>,
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("resource_count", &self.resources.len())
            .field("id_property", &self.id_property)
            .field("resource_type", &self.resource_type())
            .field("responses_count", &self.responses.len())
            .finish()
    }
}

impl Batch {
    /// Fails with `Argument` when the records are of mixed types
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let mut batch = Self {
            resources: Vec::with_capacity(records.len()),
            id_property: "id".to_string(),
            matcher: None,
            responses: Vec::new(),
            action: None,
        };

        for record in records {
            batch.add(record)?;
        }

        Ok(batch)
    }

    pub fn with_id_property(mut self, id_property: impl Into<String>) -> Self {
        self.id_property = id_property.into();
        self
    }

    /// Custom pairing used for upserted rows that already existed
    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Read `ids` of the named resource type into a new batch
    pub async fn read<I, S>(crm: &Crm, resource: &str, ids: I, id_property: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let resource = ResourceType::from_str(resource)
            .map_err(|_| CrmError::argument(format!("'{}' is not a valid resource type", resource)))?;

        crm.resource(resource).batch_read_all(ids, &[], id_property).await
    }

    pub fn add(&mut self, record: Record) -> Result<()> {
        if let Some(first) = self.resources.first() {
            if first.resource() != record.resource() {
                return Err(CrmError::argument("all resources in a batch must be of the same type"));
            }
        }

        self.resources.push(record);
        Ok(())
    }

    pub fn resources(&self) -> &[Record] {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut [Record] {
        &mut self.resources
    }

    pub fn into_resources(self) -> Vec<Record> {
        self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    pub fn responses(&self) -> &[BatchResponse] {
        &self.responses
    }

    pub fn action(&self) -> Option<BatchAction> {
        self.action
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        self.resources.first().map(Record::resource)
    }

    pub fn any_changes(&self) -> bool {
        self.resources.iter().any(Record::has_changes)
    }

    pub fn all_successful(&self) -> bool {
        self.responses.iter().all(BatchResponse::all_successful)
    }

    /// Some chunk was partial and no chunk was fully successful
    pub fn partial_success(&self) -> bool {
        self.responses.iter().any(BatchResponse::partial_success)
            && !self.responses.iter().any(BatchResponse::all_successful)
    }

    pub fn any_failed(&self) -> bool {
        self.responses
            .iter()
            .any(|r| !r.all_successful() && !r.partial_success())
    }

    pub async fn create(&mut self, crm: &Crm) -> Result<bool> {
        self.save(crm, BatchAction::Create).await
    }

    pub async fn update(&mut self, crm: &Crm) -> Result<bool> {
        self.save(crm, BatchAction::Update).await
    }

    /// Create-or-update keyed by `id_property`, which must not be `id` and
    /// must be set on every record
    pub async fn upsert(&mut self, crm: &Crm) -> Result<bool> {
        self.validate_upsert()?;
        self.save(crm, BatchAction::Upsert).await
    }

    pub async fn archive(&mut self, crm: &Crm) -> Result<bool> {
        self.save(crm, BatchAction::Archive).await
    }

    fn validate_upsert(&self) -> Result<()> {
        if self.id_property == "id" {
            return Err(CrmError::argument("id_property cannot be 'id' for upsert"));
        }

        let missing = self.resources.iter().any(|record| {
            record
                .identifier(&self.id_property)
                .is_none_or(|value| is_blank(&value))
        });
        if missing {
            return Err(CrmError::argument(format!(
                "all resources must have a non-blank value for {} to perform upsert",
                self.id_property
            )));
        }

        Ok(())
    }

    /// Returns `Ok(false)` without calling the API when no record has
    /// anything to send; otherwise `Ok(!any_failed)`.
    async fn save(&mut self, crm: &Crm, action: BatchAction) -> Result<bool> {
        self.action = Some(action);
        let resource = self
            .resource_type()
            .ok_or_else(|| CrmError::argument("batch is empty"))?;

        let inputs = self.gather_inputs(action);
        if inputs.is_empty() {
            debug!("Batch {} of {} has no inputs, skipping", action, resource.name());
            return Ok(false);
        }

        let url = constants::batch_endpoint(resource.api_root(), &resource.name(), action.as_str());
        let limit = resource.batch_limit();
        let first_new_response = self.responses.len();

        for (index, chunk) in inputs.chunks(limit).enumerate() {
            debug!(
                "Batch {} chunk {} of {} with {} inputs",
                action,
                index + 1,
                inputs.len().div_ceil(limit),
                chunk.len()
            );

            let request = ApiRequest::post(url.as_str(), json!({ "inputs": chunk }));
            let response = crm.gateway().send(request).await?;
            if !response.ok() {
                return Err(CrmError::from_response(&response));
            }

            let response = BatchResponse::new(response.status, response.json);
            if response.partial_success() {
                warn!(
                    "Batch {} of {} partially succeeded with {} errors",
                    action,
                    resource.name(),
                    response.errors().len()
                );
            }
            self.responses.push(response);
        }

        if action != BatchAction::Archive {
            let responses: Vec<BatchResponse> = self.responses[first_new_response..].to_vec();
            for response in &responses {
                self.reconcile(action, response.results());
            }
        }

        info!(
            "Batch {} of {} {}: {} inputs",
            action,
            resource.name(),
            if self.any_failed() { "had failures" } else { "finished" },
            inputs.len()
        );

        Ok(!self.any_failed())
    }

    fn gather_inputs(&self, action: BatchAction) -> Vec<Value> {
        self.resources
            .iter()
            .filter(|record| action == BatchAction::Archive || record.has_changes())
            .map(|record| {
                let mut input = serde_json::Map::new();

                if let Some(id) = self.input_id(record) {
                    input.insert("id".to_string(), id);
                }
                if self.id_property != "id" {
                    input.insert("idProperty".to_string(), json!(self.id_property));
                }
                if action != BatchAction::Archive {
                    input.insert("properties".to_string(), Value::Object(record.changes().clone()));
                }

                Value::Object(input)
            })
            .collect()
    }

    /// Remote ids go out as strings; custom id properties as their value
    fn input_id(&self, record: &Record) -> Option<Value> {
        if self.id_property == "id" {
            return record.id().map(|id| Value::String(id.to_string()));
        }

        record.identifier(&self.id_property).filter(|value| !value.is_null())
    }

    fn find_match(&self, action: BatchAction, result: &Value) -> Option<usize> {
        let by_update = || -> Option<usize> {
            if self.id_property == "id" {
                self.position(&IdMatcher, result)
            } else {
                self.position(&PropertyMatcher::new(self.id_property.as_str()), result)
            }
        };

        match action {
            BatchAction::Create => self.position(&CreateMatcher, result),
            BatchAction::Update => by_update(),
            BatchAction::Upsert => {
                if result.get("new").and_then(Value::as_bool).unwrap_or(false) {
                    self.position(&CreateMatcher, result)
                } else if let Some(matcher) = &self.matcher {
                    self.position(matcher.as_ref(), result)
                } else {
                    by_update()
                }
            }
            BatchAction::Archive => None,
        }
    }

    fn position(&self, matcher: &dyn Matcher, result: &Value) -> Option<usize> {
        self.resources
            .iter()
            .position(|record| matcher.matches(record, result))
    }

    fn reconcile(&mut self, action: BatchAction, results: &[Value]) {
        for result in results {
            let Some(index) = self.find_match(action, result) else {
                debug!("No local record matched batch result {}", result.get("id").unwrap_or(&Value::Null));
                continue;
            };

            let record = &mut self.resources[index];

            if let Some(id) = result.get("id").and_then(|raw| record.resource().id_from_value(raw)) {
                record.set_id(Some(id));
            }

            if let Some(properties) = result.get("properties").and_then(Value::as_object) {
                for (key, value) in properties {
                    if record.changes().contains_key(key) {
                        record.commit_change(key, value.clone());
                    }
                }
            }

            if let Some(updated_at) = result.get("updatedAt").filter(|v| !v.is_null()) {
                record.set_metadata("updatedAt", updated_at.clone());
            }
        }
    }
}

impl TryFrom<Vec<Record>> for Batch {
    type Error = CrmError;

    fn try_from(records: Vec<Record>) -> Result<Self> {
        Batch::new(records)
    }
}
