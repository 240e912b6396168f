//! Retry policy for rate-limited and transient failures
//!
//! HubSpot answers bursts with 429 and a `Retry-After` hint. The policy
//! waits the hinted (or default) delay and reissues the identical request,
//! up to a fixed number of re-issues. There is no exponential backoff.

use std::future::Future;
use std::time::Duration;

use super::logging::{ApiLogger, RequestContext};
use crate::api::constants::headers;
use crate::api::error::{CrmError, Result};
use crate::api::gateway::ApiResponse;

/// Configuration for retry behaviour
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Re-issues after the first attempt
    pub max_retries: u32,
    /// Delay when the server gives no Retry-After hint, and for network retries
    pub default_delay: Duration,
    /// Only applies to idempotent methods; a timed-out POST may already have been applied
    pub retry_network_errors: bool,
    pub retry_server_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            default_delay: Duration::from_secs(1),
            retry_network_errors: false,
            retry_server_errors: false,
        }
    }
}

/// Types of failures and their retry behaviour
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Connection refused, DNS, reset
    Network,
    /// Client-side timeout
    Timeout,
    /// HTTP 429 Too Many Requests
    RateLimited,
    /// HTTP 5xx
    ServerError(u16),
    /// Anything else
    Permanent,
}

impl RetryableError {
    pub fn from_status_code(status: u16) -> Self {
        match status {
            429 => RetryableError::RateLimited,
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Permanent,
        }
    }

    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() || error.is_request() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Permanent
        }
    }

    fn from_outcome(outcome: &Result<ApiResponse>) -> Self {
        match outcome {
            Ok(response) => Self::from_status_code(response.status),
            Err(CrmError::Transport(err)) => Self::from_reqwest_error(err),
            Err(_) => RetryableError::Permanent,
        }
    }
}

fn is_idempotent(method: &str) -> bool {
    matches!(method, "GET" | "HEAD" | "PUT" | "PATCH" | "DELETE")
}

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn should_retry(&self, kind: &RetryableError, method: &str) -> bool {
        match kind {
            RetryableError::RateLimited => true,
            RetryableError::Network | RetryableError::Timeout => {
                self.config.retry_network_errors && is_idempotent(method)
            }
            RetryableError::ServerError(_) => self.config.retry_server_errors,
            RetryableError::Permanent => false,
        }
    }

    /// Delay before the next attempt: the server's Retry-After hint when present
    pub fn delay_for(&self, response: Option<&ApiResponse>) -> Duration {
        response
            .and_then(|r| r.header(headers::RETRY_AFTER))
            .and_then(|value| value.trim().parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(self.config.default_delay)
    }

    /// Run `operation` until it yields a non-retryable outcome or attempts run out.
    ///
    /// A 429 that survives every attempt becomes [`CrmError::RateLimitExceeded`];
    /// other exhausted outcomes are returned as they are.
    pub async fn execute<F, Fut>(
        &self,
        logger: &ApiLogger,
        context: &RequestContext,
        mut operation: F,
    ) -> Result<ApiResponse>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ApiResponse>>,
    {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = operation().await;
            let kind = RetryableError::from_outcome(&outcome);

            if !self.should_retry(&kind, &context.method) {
                return outcome;
            }

            if attempt >= max_attempts {
                logger.log_exhausted(context, attempt);
                return match outcome {
                    Ok(response) if kind == RetryableError::RateLimited => {
                        Err(CrmError::RateLimitExceeded {
                            attempts: attempt,
                            body: response.body_text(),
                        })
                    }
                    other => other,
                };
            }

            let delay = self.delay_for(outcome.as_ref().ok());
            logger.log_retry(context, attempt, &format!("{:?}", kind), delay);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::resilience::config::MonitoringConfig;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            default_delay: Duration::ZERO,
            retry_network_errors: true,
            retry_server_errors: false,
        })
    }

    fn context() -> RequestContext {
        RequestContext::new("GET", "https://api.hubapi.com/crm/v3/objects/contacts", false)
    }

    #[test]
    fn test_status_code_classification() {
        assert_eq!(RetryableError::from_status_code(429), RetryableError::RateLimited);
        assert_eq!(RetryableError::from_status_code(503), RetryableError::ServerError(503));
        assert_eq!(RetryableError::from_status_code(404), RetryableError::Permanent);
        assert_eq!(RetryableError::from_status_code(200), RetryableError::Permanent);
    }

    #[test]
    fn test_retry_after_header_wins() {
        let policy = RetryPolicy::new(RetryConfig::default());

        let hinted = ApiResponse::new(429, json!(null)).with_header("Retry-After", "2");
        assert_eq!(policy.delay_for(Some(&hinted)), Duration::from_secs(2));

        let zero = ApiResponse::new(429, json!(null)).with_header("Retry-After", "0");
        assert_eq!(policy.delay_for(Some(&zero)), Duration::ZERO);

        let garbage = ApiResponse::new(429, json!(null)).with_header("Retry-After", "soon");
        assert_eq!(policy.delay_for(Some(&garbage)), Duration::from_secs(1));

        let huge = ApiResponse::new(429, json!(null)).with_header("Retry-After", "1e30");
        assert_eq!(policy.delay_for(Some(&huge)), Duration::from_secs(1));

        let negative = ApiResponse::new(429, json!(null)).with_header("Retry-After", "-5");
        assert_eq!(policy.delay_for(Some(&negative)), Duration::from_secs(1));

        assert_eq!(policy.delay_for(None), Duration::from_secs(1));
    }

    #[test]
    fn test_network_retries_only_for_idempotent_methods() {
        let policy = fast_policy(3);

        assert!(policy.should_retry(&RetryableError::Timeout, "GET"));
        assert!(policy.should_retry(&RetryableError::Network, "PATCH"));
        assert!(policy.should_retry(&RetryableError::Network, "DELETE"));
        assert!(!policy.should_retry(&RetryableError::Timeout, "POST"));
        assert!(!policy.should_retry(&RetryableError::Network, "POST"));

        // 429 means the request was refused, so any method is safe to reissue
        assert!(policy.should_retry(&RetryableError::RateLimited, "POST"));
    }

    #[test]
    fn test_network_retries_off_by_default() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&RetryableError::Timeout, "GET"));
        assert!(policy.should_retry(&RetryableError::RateLimited, "GET"));
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_after_max_retries_plus_one() {
        let policy = fast_policy(2);
        let logger = ApiLogger::new(MonitoringConfig::default());
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(&logger, &context(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ApiResponse::new(429, json!("Rate limit exceeded")))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(CrmError::RateLimitExceeded { attempts, body }) => {
                assert_eq!(attempts, 3);
                assert_eq!(body, "Rate limit exceeded");
            }
            other => panic!("expected rate limit error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_rate_limit() {
        let policy = fast_policy(3);
        let logger = ApiLogger::new(MonitoringConfig::default());
        let calls = Arc::new(AtomicU32::new(0));

        let response = policy
            .execute(&logger, &context(), || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Ok(ApiResponse::new(429, json!(null)))
                    } else {
                        Ok(ApiResponse::new(200, json!({"ok": true})))
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_errors_not_retried_by_default() {
        let policy = fast_policy(3);
        let logger = ApiLogger::new(MonitoringConfig::default());
        let calls = Arc::new(AtomicU32::new(0));

        let response = policy
            .execute(&logger, &context(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ApiResponse::new(502, json!("bad gateway")))
                }
            })
            .await
            .unwrap();

        assert_eq!(response.status, 502);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retried_when_enabled() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 1,
            default_delay: Duration::ZERO,
            retry_network_errors: true,
            retry_server_errors: true,
        });
        let logger = ApiLogger::new(MonitoringConfig::default());
        let calls = Arc::new(AtomicU32::new(0));

        let response = policy
            .execute(&logger, &context(), || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ApiResponse::new(503, json!(null)))
                }
            })
            .await
            .unwrap();

        // exhausted 5xx comes back as the response, not as a rate-limit error
        assert_eq!(response.status, 503);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
