//! Transport resilience: retry on rate limiting, timeouts and request logging

pub mod config;
pub mod logging;
pub mod retry;

pub use config::{LogLevel, MonitoringConfig, ResilienceConfig, ResilienceConfigBuilder, TimeoutConfig};
pub use logging::{ApiLogger, RequestContext};
pub use retry::{RetryConfig, RetryPolicy, RetryableError};
