//! Request logging with correlation tracking
//!
//! Every call is logged as `"<METHOD> <url> took <secs>s with status <code>"`
//! at info level. Request and response bodies only go out at debug level.

use super::config::{LogLevel, MonitoringConfig};
use log::{debug, error, info, log_enabled, warn, Level};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

/// Structured logger for API requests
#[derive(Debug, Clone)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// Context for a single HTTP exchange, including its retries
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique id sent as `X-Correlation-Id`, empty when disabled
    pub correlation_id: String,
    pub method: String,
    pub url: String,
    pub start_time: Instant,
}

impl RequestContext {
    pub fn new(method: &str, url: &str, correlation_ids: bool) -> Self {
        let correlation_id = if correlation_ids {
            uuid::Uuid::new_v4().to_string()
        } else {
            String::new()
        };

        Self {
            correlation_id,
            method: method.to_uppercase(),
            url: url.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Whether `level` is within the configured `log_level`
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.config.log_level
    }

    pub fn start_request(&self, method: &str, url: &str) -> RequestContext {
        RequestContext::new(method, url, self.config.correlation_ids)
    }

    /// Log the outgoing body (debug only)
    pub fn log_request(&self, context: &RequestContext, body: Option<&Value>) {
        if !self.config.request_logging || !self.enabled(LogLevel::Debug) || !log_enabled!(Level::Debug) {
            return;
        }

        if let Some(body) = body {
            debug!("[{}] Request body: {}", context.correlation_id, body);
        }
    }

    /// One line per completed exchange, plus the body at debug level
    pub fn log_response(&self, context: &RequestContext, status: u16, body: &str) {
        if !self.config.request_logging || !self.enabled(LogLevel::Info) {
            return;
        }

        info!(
            "{} {} took {:.2}s with status {}",
            context.method,
            context.url,
            context.elapsed().as_secs_f64(),
            status
        );

        if self.enabled(LogLevel::Debug) && log_enabled!(Level::Debug) {
            debug!("[{}] Response body: {}", context.correlation_id, body);
        }
    }

    pub fn log_retry(&self, context: &RequestContext, attempt: u32, reason: &str, delay: Duration) {
        if !self.enabled(LogLevel::Warn) {
            return;
        }

        let log_data = json!({
            "event": "retry_attempt",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "url": context.url,
            "attempt": attempt,
            "reason": reason,
            "delay_ms": delay.as_millis() as u64,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        warn!("Rate limit hit or transient failure, retrying: {}", log_data);
    }

    pub fn log_exhausted(&self, context: &RequestContext, attempts: u32) {
        error!(
            "[{}] Exceeded maximum retries for {} {} after {} attempts",
            context.correlation_id, context.method, context.url, attempts
        );
    }

    pub fn log_failure(&self, context: &RequestContext, status: u16, body: &str) {
        error!("API Error: {} - {}", status, body);
        if self.enabled(LogLevel::Debug) {
            debug!("[{}] failed request: {} {}", context.correlation_id, context.method, context.url);
        }
    }
}
