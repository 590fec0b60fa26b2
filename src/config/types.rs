//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/wordwise/) and project (.wordwise/) level configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::RetryPolicy;
use crate::constants::{cooldown as cooldown_constants, gemini as gemini_constants};
use crate::types::{Result, WordwiseError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Generative-language service settings
    pub gemini: GeminiConfig,

    /// Per-feature retry policies
    pub retry: RetryConfig,

    /// Quota cooldown settings
    pub cooldown: CooldownConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            gemini: GeminiConfig::default(),
            retry: RetryConfig::default(),
            cooldown: CooldownConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `WordwiseError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(WordwiseError::config(format!(
                "Gemini temperature must be between 0.0 and 2.0, got {}",
                self.gemini.temperature
            )));
        }

        if self.gemini.timeout_secs == 0 {
            return Err(WordwiseError::config(
                "Gemini timeout_secs must be greater than 0",
            ));
        }

        for (name, policy) in [
            ("word_details", &self.retry.word_details),
            ("image", &self.retry.image),
        ] {
            if policy.initial_delay_ms == 0 {
                return Err(WordwiseError::config(format!(
                    "retry.{}.initial_delay_ms must be greater than 0",
                    name
                )));
            }
            if policy.backoff_multiplier < 1 {
                return Err(WordwiseError::config(format!(
                    "retry.{}.backoff_multiplier must be at least 1",
                    name
                )));
            }
        }

        if self.cooldown.duration_secs == 0 {
            return Err(WordwiseError::config(
                "cooldown.duration_secs must be greater than 0",
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Gemini Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; falls back to `GEMINI_API_KEY`. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL including version segment
    pub api_base: String,

    /// Model for word details and chat
    pub model: String,

    /// Model for illustrations
    pub image_model: String,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: gemini_constants::DEFAULT_API_BASE.to_string(),
            model: gemini_constants::DEFAULT_MODEL.to_string(),
            image_model: gemini_constants::DEFAULT_IMAGE_MODEL.to_string(),
            temperature: 0.7,
            timeout_secs: gemini_constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// =============================================================================
// Retry & Cooldown
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub word_details: RetryPolicy,
    pub image: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            word_details: RetryPolicy::word_details(),
            image: RetryPolicy::image(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// How long AI features stay paused after quota exhaustion
    pub duration_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            duration_secs: cooldown_constants::DEFAULT_COOLDOWN_SECS,
        }
    }
}

impl CooldownConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.retry.word_details.max_retries, 3);
        assert_eq!(config.retry.image.initial_delay_ms, 2000);
        assert_eq!(config.cooldown.duration(), Duration::from_secs(900));
    }

    #[test]
    fn test_validate_rejects_zero_cooldown() {
        let mut config = Config::default();
        config.cooldown.duration_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.retry.image.backoff_multiplier = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("retry.image.backoff_multiplier"));
    }

    #[test]
    fn test_validate_rejects_temperature_out_of_range() {
        let mut config = Config::default();
        config.gemini.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_never_serialized_or_debugged() {
        let mut config = Config::default();
        config.gemini.api_key = Some("secret-key".to_string());

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-key"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[retry.word_details]
max_retries = 5
"#,
        )
        .unwrap();
        assert_eq!(config.retry.word_details.max_retries, 5);
        assert_eq!(config.retry.word_details.initial_delay_ms, 1000);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
    }
}
