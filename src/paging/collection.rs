//! Cursor-driven collection over list and search endpoints
//!
//! Nothing is fetched until `each_page`, `all`, `first`, `first_n` or `total`
//! is awaited. Pages are requested strictly one after another, following
//! `paging.next.after` until the server stops returning a cursor.

use std::fmt;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::Method;
use serde_json::{Map, Value, json};

use super::{PageItem, query_value};
use crate::api::constants::{MAX_PAGE_SIZE, OBJECT_ID_PROPERTY, SEARCH_PAGE_DELAY_MS};
use crate::api::error::{CrmError, Result};
use crate::api::gateway::{ApiRequest, HttpGateway};
use crate::api::query::{FilterGroup, PageResponse};
use crate::resource::{Record, ResourceType};

pub struct PagedCollection<T = Record> {
    gateway: Arc<dyn HttpGateway>,
    url: String,
    params: Map<String, Value>,
    resource: Option<ResourceType>,
    method: Method,
    results_field: String,
    total: Option<u64>,
    page_delay: Duration,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for PagedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            url: self.url.clone(),
            params: self.params.clone(),
            resource: self.resource,
            method: self.method.clone(),
            results_field: self.results_field.clone(),
            total: self.total,
            page_delay: self.page_delay,
            _item: PhantomData,
        }
    }
}

impl<T> fmt::Debug for PagedCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedCollection")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("resource", &self.resource)
            .field("total", &self.total)
            .finish()
    }
}

impl<T: PageItem> PagedCollection<T> {
    /// A GET collection reading `results`
    pub fn new(gateway: Arc<dyn HttpGateway>, url: impl Into<String>) -> Self {
        Self {
            gateway,
            url: url.into(),
            params: Map::new(),
            resource: None,
            method: Method::GET,
            results_field: "results".to_string(),
            total: None,
            page_delay: Duration::from_millis(SEARCH_PAGE_DELAY_MS),
            _item: PhantomData,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_resource(mut self, resource: ResourceType) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_results_field(mut self, field: impl Into<String>) -> Self {
        self.results_field = field.into();
        self
    }

    /// Delay between search pages; list collections never wait
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn resource(&self) -> Option<ResourceType> {
        self.resource
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Total reported by the last search page seen, if any
    pub fn known_total(&self) -> Option<u64> {
        self.total
    }

    pub fn is_search_request(&self) -> bool {
        self.url.contains("/search")
    }

    /// Fetch pages in order and hand each non-empty one to `on_page`.
    /// Returning `ControlFlow::Break` stops before the next request.
    pub async fn each_page<F>(&mut self, mut on_page: F) -> Result<()>
    where
        F: FnMut(Vec<T>) -> ControlFlow<()>,
    {
        let mut after: Option<String> = None;
        let mut page_number = 0usize;

        loop {
            if page_number > 0 && self.is_search_request() && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            page_number += 1;

            let request = self.page_request(after.as_deref());
            let json = self.gateway.send(request).await?.into_json()?;
            let page = PageResponse::from_json(&json, &self.results_field);

            if let Some(total) = page.total {
                self.total = Some(total);
            }
            debug!(
                "Page {} of {} returned {} results (more: {})",
                page_number,
                self.url,
                page.len(),
                page.has_more()
            );

            let next = page.next_after.clone();
            let items = page
                .results
                .into_iter()
                .map(|result| T::from_result(self.resource, result))
                .collect::<Result<Vec<T>>>()?;

            if !items.is_empty() && on_page(items).is_break() {
                break;
            }

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        Ok(())
    }

    /// Every item of every page, in order
    pub async fn all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.each_page(|page| {
            items.extend(page);
            ControlFlow::Continue(())
        })
        .await?;
        Ok(items)
    }

    pub async fn first(&mut self) -> Result<Option<T>> {
        Ok(self.first_n(1).await?.into_iter().next())
    }

    /// Up to `n` items, fetching only as many pages as needed.
    ///
    /// The page size is temporarily set to `min(n, 100)`; the caller's own
    /// `limit` is restored afterwards, even when a page request fails.
    pub async fn first_n(&mut self, n: usize) -> Result<Vec<T>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let original_limit = self.params.remove("limit");
        self.params.insert("limit".to_string(), json!(n.min(MAX_PAGE_SIZE)));

        let mut items = Vec::new();
        let outcome = self
            .each_page(|page| {
                items.extend(page);
                if items.len() >= n {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;

        restore_param(&mut self.params, "limit", original_limit);
        outcome?;

        items.truncate(n);
        Ok(items)
    }

    /// Number of matching records, from a one-record probe request.
    ///
    /// Only search endpoints report a total.
    pub async fn total(&mut self) -> Result<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }

        if !self.is_search_request() {
            return Err(CrmError::NotImplemented(
                "total is only available for search requests".to_string(),
            ));
        }

        let original_properties = self.params.remove("properties");
        self.params
            .insert("properties".to_string(), json!([OBJECT_ID_PROPERTY]));

        let outcome = self.first_n(1).await;

        restore_param(&mut self.params, "properties", original_properties);
        outcome?;

        Ok(self.total.unwrap_or(0))
    }

    /// A new collection with extra filters; this one is left unchanged
    pub fn with_filters<I, K, V>(&self, conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut copy = self.clone();
        copy.total = None;
        copy.add_filters(conditions);
        copy
    }

    /// Extend the first filter group in place
    pub fn add_filters<I, K, V>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let group = FilterGroup::from_conditions(conditions);
        let mut new_filters: Vec<Value> = group.filters.iter().map(|f| f.to_value()).collect();

        let groups = self
            .params
            .entry("filterGroups".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !groups.is_array() {
            *groups = Value::Array(Vec::new());
        }

        if let Value::Array(groups) = groups {
            match groups.first_mut().and_then(|g| g.get_mut("filters")).and_then(Value::as_array_mut) {
                Some(filters) => filters.append(&mut new_filters),
                None => {
                    if groups.is_empty() {
                        groups.push(json!({"filters": new_filters}));
                    } else {
                        groups[0] = json!({"filters": new_filters});
                    }
                }
            }
        }

        self.total = None;
        self
    }

    /// Ask for more properties on every returned record
    pub fn select<I, S>(&mut self, properties: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected = self
            .params
            .entry("properties".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !selected.is_array() {
            *selected = Value::Array(Vec::new());
        }

        if let Value::Array(selected) = selected {
            for property in properties {
                let property = Value::String(property.into());
                if !selected.contains(&property) {
                    selected.push(property);
                }
            }
        }

        self
    }

    fn page_request(&self, after: Option<&str>) -> ApiRequest {
        let mut params = self.params.clone();
        if let Some(after) = after {
            params.insert("after".to_string(), Value::String(after.to_string()));
        }

        if self.method == Method::GET {
            params
                .iter()
                .fold(ApiRequest::get(self.url.as_str()), |request, (key, value)| {
                    request.with_query(key.as_str(), query_value(value))
                })
        } else {
            ApiRequest::new(self.method.clone(), self.url.as_str()).with_body(Value::Object(params))
        }
    }
}

fn restore_param(params: &mut Map<String, Value>, name: &str, original: Option<Value>) {
    match original {
        Some(value) => {
            params.insert(name.to_string(), value);
        }
        None => {
            params.remove(name);
        }
    }
}
