//! Type-level operations for one resource type
//!
//! Builds URLs and request bodies, hands paging to `PagedCollection` and
//! `PagedBatch`, and turns responses into `Record`s.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use reqwest::Method;
use serde_json::{Map, Value, json};

use super::kind::ResourceType;
use super::property::{Property, PropertyCache};
use super::record::{Record, RecordId};
use crate::api::constants::{self, MAX_PAGE_SIZE};
use crate::api::error::{CrmError, Result};
use crate::api::gateway::{ApiRequest, HttpGateway};
use crate::api::query::SearchQuery;
use crate::batch::Batch;
use crate::paging::{PagedBatch, PagedCollection};

#[derive(Clone)]
pub struct ResourceRepository {
    resource: ResourceType,
    gateway: Arc<dyn HttpGateway>,
    properties: PropertyCache,
}

impl std::fmt::Debug for ResourceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRepository")
            .field("resource", &self.resource)
            .finish()
    }
}

impl ResourceRepository {
    pub fn new(resource: ResourceType, gateway: Arc<dyn HttpGateway>, properties: PropertyCache) -> Self {
        Self {
            resource,
            gateway,
            properties,
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn resource_name(&self) -> String {
        self.resource.name()
    }

    fn collection_url(&self) -> String {
        constants::collection_endpoint(self.resource.api_root(), &self.resource_name())
    }

    fn record_url(&self, id: &str) -> String {
        constants::record_endpoint(self.resource.api_root(), &self.resource_name(), id)
    }

    fn search_url(&self) -> String {
        constants::search_endpoint(self.resource.api_root(), &self.resource_name())
    }

    fn batch_url(&self, action: &str) -> String {
        constants::batch_endpoint(self.resource.api_root(), &self.resource_name(), action)
    }

    async fn fetch_record(&self, request: ApiRequest) -> Result<Record> {
        let json = self.gateway.send(request).await?.into_json()?;
        Record::from_value(self.resource, json)
    }

    pub async fn find(&self, id: &RecordId) -> Result<Record> {
        self.find_with(id, &[]).await
    }

    /// GET one record, asking for `properties` plus the type's always-fetch set
    pub async fn find_with(&self, id: &RecordId, properties: &[&str]) -> Result<Record> {
        let mut request = ApiRequest::get(self.record_url(&id.to_string()));

        let properties = self.resource.property_list(properties);
        if !properties.is_empty() {
            request = request.with_query("properties", properties.join(","));
        }

        self.fetch_record(request).await
    }

    /// GET one record by an alternate unique property, e.g. `email`
    pub async fn find_by(&self, property: &str, value: &str, properties: &[&str]) -> Result<Record> {
        let mut request = ApiRequest::get(self.record_url(value)).with_query("idProperty", property);

        let properties = self.resource.property_list(properties);
        if !properties.is_empty() {
            request = request.with_query("properties", properties.join(","));
        }

        self.fetch_record(request).await
    }

    /// Look up a contact by its `hubspotutk` tracking cookie.
    ///
    /// Only the legacy v1 API supports this; its payload is converted to the
    /// v3 shape before the record is built.
    pub async fn find_by_token(&self, token: &str, properties: &[&str]) -> Result<Record> {
        if self.resource != ResourceType::Contact {
            return Err(CrmError::argument("find_by_token is only available for contacts"));
        }

        let properties = self.resource.property_list(properties);
        let request = properties
            .iter()
            .fold(ApiRequest::get(constants::contact_by_token_endpoint(token)), |request, property| {
                request.with_query("property", property.as_str())
            })
            .with_query("propertyMode", "value_only");

        let v1 = self.gateway.send(request).await?.into_json()?;
        let payload = convert_v1_contact(&v1, &properties);
        Record::from_value(self.resource, payload)
    }

    /// POST a new record and return it with its assigned id
    pub async fn create(&self, attributes: Map<String, Value>) -> Result<Record> {
        let request = ApiRequest::post(self.collection_url(), json!({ "properties": attributes }));
        let record = self.fetch_record(request).await?;
        info!("Created {} {:?}", self.resource_name(), record.id().map(|id| id.to_string()));
        Ok(record)
    }

    pub async fn update(&self, id: &RecordId, attributes: &Map<String, Value>) -> Result<bool> {
        let request = ApiRequest::patch(self.record_url(&id.to_string()), json!({ "properties": attributes }));
        self.gateway.send(request).await?.into_json()?;
        Ok(true)
    }

    pub async fn archive(&self, id: &RecordId) -> Result<bool> {
        let request = ApiRequest::delete(self.record_url(&id.to_string()));
        self.gateway.send(request).await?.into_json()?;
        info!("Archived {} {}", self.resource_name(), id);
        Ok(true)
    }

    /// Lazy GET collection over the listing endpoint
    pub fn list(&self, params: Map<String, Value>) -> PagedCollection<Record> {
        PagedCollection::new(Arc::clone(&self.gateway), self.collection_url())
            .with_params(params)
            .with_resource(self.resource)
    }

    /// Lazy search collection. `page_size` becomes the request `limit`.
    pub fn search(&self, query: impl Into<SearchQuery>, properties: &[&str], page_size: usize) -> PagedCollection<Record> {
        let mut body = Map::new();
        query.into().apply_to(&mut body);
        self.search_collection(body, properties, page_size)
    }

    /// `search` for loosely-typed input: a string or a filter map
    pub fn search_value(&self, query: Value, properties: &[&str], page_size: usize) -> Result<PagedCollection<Record>> {
        let query = SearchQuery::from_value(query)?;
        Ok(self.search(query, properties, page_size))
    }

    /// Every record, via the search endpoint with no filters
    pub fn all(&self) -> PagedCollection<Record> {
        self.search_collection(Map::new(), &[], MAX_PAGE_SIZE)
    }

    /// Search collection filtered by suffix-style conditions
    pub fn where_<I, K, V>(&self, conditions: I) -> PagedCollection<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut collection = self.all();
        collection.add_filters(conditions);
        collection
    }

    /// Search collection returning the given properties
    pub fn select<I, S>(&self, properties: I) -> PagedCollection<Record>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collection = self.all();
        collection.select(properties);
        collection
    }

    fn search_collection(&self, mut body: Map<String, Value>, properties: &[&str], page_size: usize) -> PagedCollection<Record> {
        let properties = self.resource.property_list(properties);
        if !properties.is_empty() {
            body.insert("properties".to_string(), json!(properties));
        }
        body.insert("limit".to_string(), json!(page_size));

        PagedCollection::new(Arc::clone(&self.gateway), self.search_url())
            .with_method(Method::POST)
            .with_params(body)
            .with_resource(self.resource)
    }

    /// The type's property schema, fetched once and then served from the cache
    pub async fn properties(&self) -> Result<Arc<Vec<Property>>> {
        if let Some(cached) = self.properties.get(self.resource) {
            return Ok(cached);
        }

        let request = ApiRequest::get(constants::properties_endpoint(&self.resource_name()));
        let json = self.gateway.send(request).await?.into_json()?;
        let results = json.get("results").cloned().unwrap_or_else(|| Value::Array(Vec::new()));
        let properties: Vec<Property> = serde_json::from_value(results)?;

        debug!("Cached {} properties for {}", properties.len(), self.resource_name());
        Ok(self.properties.insert(self.resource, properties))
    }

    async fn filtered_properties(&self, keep: impl Fn(&Property) -> bool) -> Result<Vec<Property>> {
        Ok(self.properties().await?.iter().filter(|p| keep(*p)).cloned().collect())
    }

    pub async fn custom_properties(&self) -> Result<Vec<Property>> {
        self.filtered_properties(Property::is_custom).await
    }

    pub async fn updatable_properties(&self) -> Result<Vec<Property>> {
        self.filtered_properties(Property::is_updatable).await
    }

    pub async fn read_only_properties(&self) -> Result<Vec<Property>> {
        self.filtered_properties(Property::is_read_only).await
    }

    pub async fn property(&self, name: &str) -> Result<Option<Property>> {
        Ok(self.properties().await?.iter().find(|p| p.name == name).cloned())
    }

    /// Property name to description (or label)
    pub async fn full_property_list(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .properties()
            .await?
            .iter()
            .map(|p| (p.name.clone(), p.summary()))
            .collect())
    }

    /// Like `full_property_list`, limited to non-HubSpot properties
    pub async fn custom_property_list(&self) -> Result<BTreeMap<String, String>> {
        Ok(self
            .custom_properties()
            .await?
            .iter()
            .map(|p| (p.name.clone(), p.summary()))
            .collect())
    }

    /// Lazy batch read of `ids`, identified by `id_property`
    pub fn batch_read<I, S>(&self, ids: I, properties: &[&str], id_property: &str) -> PagedBatch<Record>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let mut params = Map::new();
        let properties = self.resource.property_list(properties);
        if !properties.is_empty() {
            params.insert("properties".to_string(), json!(properties));
        }
        if id_property != "id" {
            params.insert("idProperty".to_string(), json!(id_property));
        }

        PagedBatch::new(Arc::clone(&self.gateway), self.batch_url("read"), ids)
            .with_params(params)
            .with_resource(self.resource)
    }

    /// Read every id up front into a `Batch` ready for bulk operations
    pub async fn batch_read_all<I, S>(&self, ids: I, properties: &[&str], id_property: &str) -> Result<Batch>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let records = self.batch_read(ids, properties, id_property).all().await?;
        Ok(Batch::new(records)?.with_id_property(id_property))
    }
}

/// `{vid, properties: {name: {value}}}` to `{id, properties: {name: value}}`.
/// With no requested properties every returned property is kept.
fn convert_v1_contact(v1: &Value, requested: &[String]) -> Value {
    let v1_properties = v1.get("properties").and_then(Value::as_object);
    let value_of = |name: &str| {
        v1_properties
            .and_then(|props| props.get(name))
            .and_then(|prop| prop.get("value"))
            .cloned()
            .unwrap_or(Value::Null)
    };

    let properties: Map<String, Value> = if requested.is_empty() {
        v1_properties
            .map(|props| props.keys().map(|name| (name.clone(), value_of(name))).collect())
            .unwrap_or_default()
    } else {
        requested.iter().map(|name| (name.clone(), value_of(name))).collect()
    };

    json!({
        "id": v1.get("vid").cloned().unwrap_or(Value::Null),
        "properties": properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_v1_contact_with_requested_properties() {
        let v1 = json!({
            "vid": 3234574,
            "properties": {
                "email": {"value": "ann@example.com"},
                "firstname": {"value": "Ann"}
            }
        });

        let payload = convert_v1_contact(&v1, &["email".to_string(), "lastname".to_string()]);
        assert_eq!(
            payload,
            json!({"id": 3234574, "properties": {"email": "ann@example.com", "lastname": null}})
        );
    }

    #[test]
    fn test_convert_v1_contact_keeps_everything_by_default() {
        let v1 = json!({"vid": 1, "properties": {"email": {"value": "a@b.c"}, "phone": {"value": "1"}}});
        let payload = convert_v1_contact(&v1, &[]);
        assert_eq!(payload["properties"], json!({"email": "a@b.c", "phone": "1"}));
    }
}
