//! Transport seam between the resource engines and HTTP
//!
//! Everything above this module talks to HubSpot through [`HttpGateway`],
//! so paging and batch logic can run against the reqwest client or a
//! scripted stand-in.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;

use super::error::Result;

/// A single request against the HubSpot API, relative to the base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Look up the first query parameter with the given name
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Structured response: status, headers and the parsed body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// Parsed JSON body; non-JSON bodies are kept as a string value, empty bodies as null
    pub json: Value,
}

impl ApiResponse {
    pub fn new(status: u16, json: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            json,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// 2xx
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 207 Multi-Status, used by the batch endpoints for mixed outcomes
    pub fn is_partial(&self) -> bool {
        self.status == 207
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        let wanted = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// Raw body as text, for error messages and debug logging
    pub fn body_text(&self) -> String {
        match &self.json {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// The body of a successful response, or the classified error
    pub fn into_json(self) -> Result<Value> {
        if self.ok() {
            Ok(self.json)
        } else {
            Err(super::error::CrmError::from_response(&self))
        }
    }
}

/// Issues requests against the remote API.
///
/// Implementations return every HTTP status as an [`ApiResponse`]; only
/// transport failures, missing configuration and exhausted rate-limit retries
/// surface as errors.
#[async_trait]
pub trait HttpGateway: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}
