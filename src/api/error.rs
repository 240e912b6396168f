//! Error taxonomy for HubSpot API interactions
//!
//! Maps HTTP status codes and response body patterns onto typed errors so
//! callers can tell a missing record from a missing OAuth scope.

use once_cell::sync::Lazy;
use regex::Regex;

use super::gateway::ApiResponse;

/// Body patterns HubSpot uses when a private app lacks a scope
static SCOPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)MISSING_SCOPES|you do not have permissions|required scopes")
        .expect("scope pattern is a valid regex")
});

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("HubSpot API not configured: set an access token before making requests")]
    NotConfigured,

    #[error("Resource not found (status {status}). Response body: {body}")]
    NotFound { status: u16, body: String },

    #[error("Private app missing required scopes (status {status}). Response body: {body}")]
    OauthScope { status: u16, body: String },

    #[error("Rate limit exceeded after {attempts} attempts. Response body: {body}")]
    RateLimitExceeded { attempts: u32, body: String },

    #[error("Request failed with status {status}: {message}. Response body: {body}")]
    Request {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Nothing to do: the record has no pending changes")]
    NothingToDo,

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrmError>;

impl CrmError {
    /// Classify a non-successful response
    pub fn from_response(response: &ApiResponse) -> Self {
        let status = response.status;
        let body = response.body_text();

        if status == 404 {
            return CrmError::NotFound { status, body };
        }

        if status == 429 {
            return CrmError::RateLimitExceeded { attempts: 1, body };
        }

        if SCOPE_PATTERN.is_match(&body) {
            return CrmError::OauthScope { status, body };
        }

        let message = response
            .json
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unexpected response")
            .to_string();

        CrmError::Request {
            status,
            message,
            body,
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        CrmError::Argument(message.into())
    }

    /// HTTP status carried by the error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            CrmError::NotFound { status, .. }
            | CrmError::OauthScope { status, .. }
            | CrmError::Request { status, .. } => Some(*status),
            CrmError::RateLimitExceeded { .. } => Some(429),
            CrmError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn response(status: u16, json: serde_json::Value) -> ApiResponse {
        ApiResponse {
            status,
            headers: HashMap::new(),
            json,
        }
    }

    #[test]
    fn test_not_found_mapping() {
        let err = CrmError::from_response(&response(404, json!({"message": "gone"})));
        assert!(matches!(err, CrmError::NotFound { status: 404, .. }));
    }

    #[test]
    fn test_rate_limit_mapping() {
        let err = CrmError::from_response(&response(429, json!("Rate limit exceeded")));
        assert!(matches!(err, CrmError::RateLimitExceeded { .. }));
        assert_eq!(err.status(), Some(429));
    }

    #[test]
    fn test_scope_mapping() {
        let body = json!({
            "status": "error",
            "message": "This app hasn't been granted all required scopes to make this call.",
            "category": "MISSING_SCOPES"
        });
        let err = CrmError::from_response(&response(403, body));
        assert!(matches!(err, CrmError::OauthScope { status: 403, .. }));
        assert!(err.to_string().contains("required scopes"));

        let err = CrmError::from_response(&response(403, json!("You do not have permissions to view this")));
        assert!(matches!(err, CrmError::OauthScope { .. }));
    }

    #[test]
    fn test_generic_request_error_keeps_status_and_message() {
        let err = CrmError::from_response(&response(400, json!({"message": "Property values were not valid"})));
        match err {
            CrmError::Request { status, message, body } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Property values were not valid");
                assert!(body.contains("Property values"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
