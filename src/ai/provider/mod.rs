//! Generative-Language Service Abstraction
//!
//! Defines the `AiProvider` trait for the three operation kinds the app
//! consumes: JSON generation, image generation, and the streaming tutor chat.
//! Providers report failures as normalized [`ServiceError`]s; retry and
//! cooldown policy live in the gateway, not here.
//!
//! ## Modules
//!
//! - `gemini`: REST client for the Gemini / Imagen endpoints
//! - `sse`: incremental server-sent-events decoder for streamed chat

mod gemini;
mod sse;

pub use gemini::GeminiProvider;
pub use sse::SseDecoder;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::config::GeminiConfig;
use crate::types::{ChatMessage, GeneratedImage, Result, ServiceError};

/// Incremental text chunks of a streamed reply
pub type ChatStream = BoxStream<'static, std::result::Result<String, ServiceError>>;

/// Shared provider type for concurrent use by call sites
pub type SharedProvider = Arc<dyn AiProvider>;

/// External generative-language service
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a JSON document constrained by `schema`
    async fn generate_json(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> std::result::Result<Value, ServiceError>;

    /// Generate one image for `prompt`.
    ///
    /// A filtered or empty result is returned as an empty image, not an error.
    async fn generate_image(&self, prompt: &str)
    -> std::result::Result<GeneratedImage, ServiceError>;

    /// Start a streamed tutor reply
    async fn stream_chat(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> std::result::Result<ChatStream, ServiceError>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &GeminiConfig) -> Result<SharedProvider> {
    Ok(Arc::new(GeminiProvider::new(config.clone())?))
}
