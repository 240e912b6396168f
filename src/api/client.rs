use super::constants::{self, headers};
use super::error::{CrmError, Result};
use super::gateway::{ApiRequest, ApiResponse, HttpGateway};
use super::resilience::{ApiLogger, RequestContext, ResilienceConfig, RetryPolicy};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// HubSpot API client with connection pooling and 429 retry handling
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http_client: reqwest::Client,
    access_token: Option<String>,
    retry_policy: RetryPolicy,
    api_logger: ApiLogger,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        Self::with_resilience(base_url, access_token, ResilienceConfig::default())
    }

    pub fn with_resilience(
        base_url: impl Into<String>,
        access_token: Option<String>,
        resilience: ResilienceConfig,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)                    // Max idle connections per host
            .pool_idle_timeout(Duration::from_secs(90))    // Keep connections alive for 90s
            .timeout(resilience.timeouts.total())          // Read + write deadline
            .connect_timeout(resilience.timeouts.connect)
            .user_agent(headers::USER_AGENT)
            .build()?;

        Ok(Self::with_custom_client(base_url, access_token, http_client, resilience))
    }

    /// Create a client around a preconfigured reqwest client
    pub fn with_custom_client(
        base_url: impl Into<String>,
        access_token: Option<String>,
        http_client: reqwest::Client,
        resilience: ResilienceConfig,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            retry_policy: RetryPolicy::new(resilience.retry),
            api_logger: ApiLogger::new(resilience.monitoring),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_resilience(
            config.base_url.clone(),
            config.access_token.clone(),
            config.resilience(),
        )
    }

    pub fn default_base_url() -> &'static str {
        constants::DEFAULT_BASE_URL
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// True once an access token is set
    pub fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// One HTTP exchange, no retries
    async fn send_once(&self, request: &ApiRequest, context: &RequestContext) -> Result<ApiResponse> {
        let url = self.url(&request.path);

        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, headers::CONTENT_TYPE_JSON)
            .header(ACCEPT, headers::CONTENT_TYPE_JSON);

        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        if !context.correlation_id.is_empty() {
            builder = builder.header(headers::X_CORRELATION_ID, &context.correlation_id);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let response = Self::parse_response(response).await?;
        let body = response.body_text();
        self.api_logger.log_response(context, response.status, &body);
        if response.status >= 400 && response.status != 429 {
            self.api_logger.log_failure(context, response.status, &body);
        }

        Ok(response)
    }

    /// Parse an HTTP response into an ApiResponse
    async fn parse_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let mut headers = HashMap::new();

        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.to_string(), value_str.to_string());
            }
        }

        let text = response.text().await?;
        let json = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(json) => json,
                Err(_) => Value::String(text),
            }
        };

        Ok(ApiResponse {
            status,
            headers,
            json,
        })
    }
}

#[async_trait]
impl HttpGateway for ApiClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        if !self.is_configured() {
            return Err(CrmError::NotConfigured);
        }

        let url = self.url(&request.path);
        let context = self.api_logger.start_request(request.method.as_str(), &url);
        self.api_logger.log_request(&context, request.body.as_ref());

        self.retry_policy
            .execute(&self.api_logger, &context, || self.send_once(&request, &context))
            .await
    }
}
