//! Batch-read pager: slices a fixed id list into POSTs of at most 100 inputs

use std::fmt;
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value, json};

use super::PageItem;
use crate::api::constants::BATCH_READ_LIMIT;
use crate::api::error::Result;
use crate::api::gateway::{ApiRequest, HttpGateway};
use crate::api::query::PageResponse;
use crate::resource::{Record, ResourceType};

pub struct PagedBatch<T = Record> {
    gateway: Arc<dyn HttpGateway>,
    url: String,
    params: Map<String, Value>,
    resource: Option<ResourceType>,
    ids: Vec<String>,
    chunk_size: usize,
    _item: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for PagedBatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedBatch")
            .field("url", &self.url)
            .field("params", &self.params)
            .field("resource", &self.resource)
            .field("ids", &self.ids.len())
            .finish()
    }
}

impl<T: PageItem> PagedBatch<T> {
    pub fn new<I, S>(gateway: Arc<dyn HttpGateway>, url: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            gateway,
            url: url.into(),
            params: Map::new(),
            resource: None,
            ids: ids.into_iter().map(|id| id.to_string()).collect(),
            chunk_size: BATCH_READ_LIMIT,
            _item: PhantomData,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_resource(mut self, resource: ResourceType) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Requests needed to read every id
    pub fn page_count(&self) -> usize {
        self.ids.len().div_ceil(self.chunk_size)
    }

    /// One POST per id chunk, in order; empty pages are skipped
    pub async fn each_page<F>(&self, mut on_page: F) -> Result<()>
    where
        F: FnMut(Vec<T>) -> ControlFlow<()>,
    {
        for (index, chunk) in self.ids.chunks(self.chunk_size).enumerate() {
            let mut body = self.params.clone();
            let inputs: Vec<Value> = chunk.iter().map(|id| json!({"id": id})).collect();
            body.insert("inputs".to_string(), Value::Array(inputs));

            let request = ApiRequest::post(self.url.as_str(), Value::Object(body));
            let json = self.gateway.send(request).await?.into_json()?;
            let page = PageResponse::from_json(&json, "results");

            debug!(
                "Batch read chunk {}/{} of {} returned {} results",
                index + 1,
                self.page_count(),
                self.url,
                page.len()
            );

            let items = page
                .results
                .into_iter()
                .map(|result| T::from_result(self.resource, result))
                .collect::<Result<Vec<T>>>()?;

            if !items.is_empty() && on_page(items).is_break() {
                break;
            }
        }

        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.each_page(|page| {
            items.extend(page);
            ControlFlow::Continue(())
        })
        .await?;
        Ok(items)
    }
}
