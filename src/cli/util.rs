//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::Path;
use std::sync::Arc;

use crate::ai::{Gateway, VocabAssistant, create_provider};
use crate::cli::ui::ConsoleNotifier;
use crate::config::{Config, ConfigLoader};
use crate::types::{Result, WordwiseError};

/// Command execution context
///
/// One gateway per process, so every command invocation shares a single
/// quota cooldown across its word, image and chat calls.
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    pub assistant: VocabAssistant,
}

impl CommandContext {
    /// Load config (from `config_path` if given), then build the provider and gateway
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let provider = create_provider(&config.gemini)?;
        let console = Arc::new(ConsoleNotifier::new());

        let gateway = Gateway::builder()
            .cooldown(config.cooldown.duration())
            .notifier(console.clone())
            .loading_indicator(console)
            .build();

        let assistant = VocabAssistant::new(Arc::new(gateway), provider)
            .with_policies(config.retry.word_details, config.retry.image);

        Ok(Self { config, assistant })
    }
}

/// Turn a missing gateway result into an error so the process exits non-zero.
///
/// The gateway has already notified the user, so the message stays short.
pub fn require<T>(value: Option<T>, what: impl Into<String>) -> Result<T> {
    value.ok_or_else(|| WordwiseError::Unavailable(what.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_maps_none_to_error() {
        assert_eq!(require(Some(3), "Word details").unwrap(), 3);
        let err = require::<u32>(None, "Word details for \"wry\"").unwrap_err();
        assert!(matches!(err, WordwiseError::Unavailable(_)));
        assert_eq!(err.to_string(), "Word details for \"wry\" unavailable");
    }

    #[test]
    fn test_context_applies_configured_cooldown() {
        let mut config = Config::default();
        config.gemini.api_key = Some("test-key".to_string());
        config.cooldown.duration_secs = 120;

        let ctx = CommandContext::from_config(config).unwrap();
        assert_eq!(
            ctx.assistant.gateway().cooldown().duration(),
            std::time::Duration::from_secs(120)
        );
    }
}
