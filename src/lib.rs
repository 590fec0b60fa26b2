//! Wordwise - AI Request Gateway for a Vocabulary App
//!
//! Every call to the generative-language service goes through a [`Gateway`]
//! that retries transient failures with exponential backoff, validates that
//! payloads are complete, and pauses all AI features for a fixed cooldown once
//! the service reports quota exhaustion.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wordwise::{ConfigLoader, Gateway, VocabAssistant, create_provider};
//!
//! let config = ConfigLoader::load()?;
//! let gateway = Arc::new(Gateway::builder().cooldown(config.cooldown.duration()).build());
//! let assistant = VocabAssistant::new(gateway, create_provider(&config.gemini)?);
//!
//! if let Some(details) = assistant.word_details("laconic").await {
//!     println!("{}", details.definition);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: gateway, quota cooldown, notifications, Gemini provider, call sites
//! - [`config`]: layered TOML/env configuration
//! - [`types`]: error normalization and classification, word payloads
//! - [`cli`]: command-line front end

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, CooldownConfig, GeminiConfig, RetryConfig};

// Error Types
pub use types::error::{ErrorCategory, ErrorClassifier, Result, ServiceError, WordwiseError};

// Payloads
pub use types::{ChatMessage, ChatRole, FeatureName, GeneratedImage, WordDetails};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    // Provider
    AiProvider,
    // Cooldown
    CooldownState,
    // Gateway
    Gateway,
    GatewayBuilder,
    GeminiProvider,
    IncompleteFallback,
    // Notifications
    NotificationLog,
    Notifier,
    NotifyLevel,
    QuotaCooldown,
    QuotaState,
    RequestOutcome,
    RetryPolicy,
    // Time
    Timer,
    TokioTimer,
    // Call sites
    VocabAssistant,
    create_provider,
};
