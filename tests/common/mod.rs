//! Scripted gateway shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hubspot_crm::{ApiRequest, ApiResponse, Crm, CrmError, HttpGateway, Result};
use serde_json::Value;

/// Records every request and answers with queued responses in order.
/// An empty queue answers 200 with an empty `results` page.
#[derive(Default)]
pub struct MockGateway {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<ApiResponse>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, status: u16, json: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(ApiResponse::new(status, json));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn body(&self, index: usize) -> Value {
        self.requests()[index].body.clone().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl HttpGateway for MockGateway {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => Ok(response),
            None => Ok(ApiResponse::new(200, serde_json::json!({"results": []}))),
        }
    }
}

/// A gateway that must never be reached
pub struct Unreachable;

#[async_trait]
impl HttpGateway for Unreachable {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        panic!("unexpected request: {} {}", request.method, request.path);
    }
}

pub fn crm(gateway: &Arc<MockGateway>) -> Crm {
    Crm::new(gateway.clone())
}

pub fn unreachable_crm() -> Crm {
    Crm::new(Arc::new(Unreachable))
}

pub fn is_argument(err: &CrmError) -> bool {
    matches!(err, CrmError::Argument(_))
}
