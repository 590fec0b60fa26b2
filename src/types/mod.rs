pub mod error;
pub mod word;

pub use error::{
    ErrorCategory, ErrorClassifier, RESOURCE_EXHAUSTED, Result, ServiceError, WordwiseError,
};
pub use word::{ChatMessage, ChatRole, GeneratedImage, WordDetails};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Human-readable name of the feature issuing an AI request
///
/// Used in user-facing notifications ("word details", "word image", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureName(String);

impl FeatureName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FeatureName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FeatureName {
    fn from(s: String) -> Self {
        Self(s)
    }
}
