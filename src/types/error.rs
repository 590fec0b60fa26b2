//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provides failure classification for the AI gateway's retry and cooldown
//! decisions.
//!
//! ## Error Categories
//!
//! - **QuotaExhausted**: usage allowance depleted (open the cooldown, never retry)
//! - **RateLimited**: HTTP 429 without a quota signal (wait and retry)
//! - **Transient**: anything else the service raised (retry with backoff)
//! - **IncompletePayload**: a parsed response missing required fields (retry)
//!
//! ## Normalization
//!
//! The service reports failures in two shapes. Both collapse into a single
//! [`ServiceError`] before classification:
//!
//! ```text
//! nested: {"error": {"message": "...", "code": 429, "status": "RESOURCE_EXHAUSTED"}}
//! flat:   {"message": "...", "status": 429}
//! ```

use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Failure categories used for retry and cooldown routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Quota depleted - open the cooldown, stop immediately
    QuotaExhausted,
    /// Rate limited (429) - retry with rate-limit wording
    RateLimited,
    /// Any other service failure - retry with generic wording
    Transient,
    /// Response parsed but required fields were missing - retry
    IncompletePayload,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExhausted => write!(f, "QUOTA_EXHAUSTED"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::IncompletePayload => write!(f, "INCOMPLETE_PAYLOAD"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category may be retried against the same service
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::QuotaExhausted)
    }

    /// Check if this category opens the quota cooldown
    pub fn trips_cooldown(&self) -> bool {
        matches!(self, Self::QuotaExhausted)
    }
}

// =============================================================================
// Service Error
// =============================================================================

/// Status string the service uses for quota exhaustion
pub const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// Normalized failure reported by the generative-language service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// Human-readable message
    pub message: String,
    /// Numeric status code (HTTP), if present
    pub status_code: Option<u16>,
    /// Machine-readable status string, if present
    pub status: Option<String>,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.status_code, self.status.as_deref()) {
            (Some(code), Some(status)) => write!(f, "[{} {}] {}", code, status, self.message),
            (Some(code), None) => write!(f, "[{}] {}", code, self.message),
            (None, Some(status)) => write!(f, "[{}] {}", status, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Create an error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            status: None,
        }
    }

    /// Attach a numeric status code
    pub fn with_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Attach a machine-readable status string
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Normalize a raw error document (nested or flat shape).
    ///
    /// A flat message that is itself a serialized nested error is unwrapped,
    /// since SDK-style errors often embed the service body in `message`.
    pub fn from_value(value: &Value) -> Self {
        if let Some(nested) = value.get("error").filter(|e| e.is_object()) {
            return Self::from_fields(nested);
        }

        if value.is_object() {
            let flat = Self::from_fields(value);
            if let Ok(embedded) = serde_json::from_str::<Value>(flat.message.trim())
                && embedded.get("error").is_some_and(Value::is_object)
            {
                let mut inner = Self::from_value(&embedded);
                inner.status_code = inner.status_code.or(flat.status_code);
                inner.status = inner.status.or(flat.status);
                return inner;
            }
            return flat;
        }

        match value {
            Value::String(s) => Self::new(s.clone()),
            other => Self::new(other.to_string()),
        }
    }

    /// Build from a non-success HTTP response
    pub fn from_http(status: u16, body: &str) -> Self {
        let mut err = match serde_json::from_str::<Value>(body) {
            Ok(value) if value.is_object() => Self::from_value(&value),
            _ if body.trim().is_empty() => Self::new(format!("HTTP {}", status)),
            _ => Self::new(body.trim().to_string()),
        };
        if err.status_code.is_none() {
            err.status_code = Some(status);
        }
        err
    }

    fn from_fields(obj: &Value) -> Self {
        let message = obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| obj.to_string());

        let mut status_code = obj.get("code").and_then(parse_code);
        let mut status = None;

        match obj.get("status") {
            Some(Value::String(s)) => match s.parse::<u16>() {
                Ok(code) => status_code = status_code.or(Some(code)),
                Err(_) => status = Some(s.clone()),
            },
            Some(v @ Value::Number(_)) => status_code = status_code.or_else(|| parse_code(v)),
            _ => {}
        }

        Self {
            message,
            status_code,
            status,
        }
    }
}

fn parse_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let base = Self::new(err.to_string());
        match err.status() {
            Some(status) => base.with_code(status.as_u16()),
            None => base,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Malformed service response: {}", err))
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Classifies normalized service errors for the gateway
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify a normalized service error
    pub fn classify(err: &ServiceError) -> ErrorCategory {
        if Self::is_quota_exhausted(err) {
            ErrorCategory::QuotaExhausted
        } else if err.status_code == Some(429) {
            ErrorCategory::RateLimited
        } else {
            ErrorCategory::Transient
        }
    }

    /// Quota exhaustion predicate
    pub fn is_quota_exhausted(err: &ServiceError) -> bool {
        let lower = err.message.to_lowercase();
        let mentions_quota = lower.contains("quota");

        if err.status_code == Some(429) && mentions_quota {
            return true;
        }

        if err.status.as_deref() == Some(RESOURCE_EXHAUSTED) {
            return true;
        }

        err.status_code.is_none()
            && mentions_quota
            && (lower.contains("exceeded") || lower.contains("exhausted"))
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum WordwiseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("AI service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0} unavailable")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, WordwiseError>;

impl WordwiseError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::QuotaExhausted.to_string(), "QUOTA_EXHAUSTED");
        assert_eq!(ErrorCategory::RateLimited.to_string(), "RATE_LIMITED");
        assert_eq!(ErrorCategory::Transient.to_string(), "TRANSIENT");
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::RateLimited.is_retryable());
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(ErrorCategory::IncompletePayload.is_retryable());
        assert!(!ErrorCategory::QuotaExhausted.is_retryable());
        assert!(ErrorCategory::QuotaExhausted.trips_cooldown());
    }

    #[test]
    fn test_normalize_nested_shape() {
        let err = ServiceError::from_value(&json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED"
            }
        }));
        assert_eq!(err.status_code, Some(429));
        assert_eq!(err.status.as_deref(), Some(RESOURCE_EXHAUSTED));
        assert!(err.message.starts_with("Resource has been exhausted"));
    }

    #[test]
    fn test_normalize_flat_shape() {
        let err = ServiceError::from_value(&json!({
            "message": "Too many requests",
            "status": 429
        }));
        assert_eq!(err.status_code, Some(429));
        assert_eq!(err.status, None);
        assert_eq!(err.message, "Too many requests");
    }

    #[test]
    fn test_normalize_flat_with_embedded_body() {
        let body = json!({
            "error": {"code": 429, "message": "quota hit", "status": "RESOURCE_EXHAUSTED"}
        })
        .to_string();
        let err = ServiceError::from_value(&json!({"message": body, "status": 429}));
        assert_eq!(err.message, "quota hit");
        assert_eq!(err.status.as_deref(), Some(RESOURCE_EXHAUSTED));
    }

    #[test]
    fn test_from_http_fills_missing_code() {
        let err = ServiceError::from_http(503, "upstream overloaded");
        assert_eq!(err.status_code, Some(503));
        assert_eq!(err.message, "upstream overloaded");

        let empty = ServiceError::from_http(500, "");
        assert_eq!(empty.message, "HTTP 500");
    }

    #[test]
    fn test_classify_quota_without_code() {
        let err = ServiceError::new("Daily quota exceeded for this project");
        assert_eq!(ErrorClassifier::classify(&err), ErrorCategory::QuotaExhausted);

        let exhausted = ServiceError::new("Resource quota exhausted, try again tomorrow");
        assert_eq!(ErrorClassifier::classify(&exhausted), ErrorCategory::QuotaExhausted);

        let not_quota = ServiceError::new("quota information unavailable");
        assert_eq!(ErrorClassifier::classify(&not_quota), ErrorCategory::Transient);
    }

    #[test]
    fn test_classify_quota_word_with_other_code_is_transient() {
        let err = ServiceError::new("quota exceeded").with_code(500);
        assert_eq!(ErrorClassifier::classify(&err), ErrorCategory::Transient);
    }

    #[test]
    fn test_classify_generic() {
        let err = ServiceError::new("connection reset by peer");
        assert_eq!(ErrorClassifier::classify(&err), ErrorCategory::Transient);
    }

    #[test]
    fn test_service_error_display() {
        let err = ServiceError::new("slow down")
            .with_code(429)
            .with_status("UNAVAILABLE");
        assert_eq!(err.to_string(), "[429 UNAVAILABLE] slow down");
        assert_eq!(ServiceError::new("boom").to_string(), "boom");
    }

    proptest! {
        #[test]
        fn prop_429_with_quota_is_exhausted(
            prefix in "[a-zA-Z ]{0,20}",
            suffix in "[a-zA-Z ]{0,20}",
            status in proptest::option::of("[A-Z_]{1,20}"),
        ) {
            let mut err = ServiceError::new(format!("{prefix}quota{suffix}")).with_code(429);
            err.status = status;
            prop_assert_eq!(ErrorClassifier::classify(&err), ErrorCategory::QuotaExhausted);
        }

        #[test]
        fn prop_resource_exhausted_without_code(message in ".{0,60}") {
            let err = ServiceError::new(message).with_status(RESOURCE_EXHAUSTED);
            prop_assert_eq!(ErrorClassifier::classify(&err), ErrorCategory::QuotaExhausted);
        }

        #[test]
        fn prop_plain_429_is_rate_limited(
            message in "[a-pr-z ]{0,40}",
            status in proptest::option::of("[A-Z]{1,12}"),
        ) {
            let mut err = ServiceError::new(message).with_code(429);
            err.status = status.filter(|s| s != RESOURCE_EXHAUSTED);
            prop_assert_eq!(ErrorClassifier::classify(&err), ErrorCategory::RateLimited);
        }
    }
}
