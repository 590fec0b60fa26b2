//! Vocabulary call sites.
//!
//! Word details and illustrations go through the gateway with their own retry
//! policies. The tutor chat streams directly but still honors the cooldown.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info};

use super::gateway::{Gateway, IncompleteFallback, RetryPolicy};
use super::notify::NotifyLevel;
use super::provider::SharedProvider;
use crate::types::{
    ChatMessage, ErrorClassifier, FeatureName, GeneratedImage, ServiceError, WordDetails,
};

const WORD_DETAILS_FEATURE: &str = "Word details";
const WORD_IMAGE_FEATURE: &str = "Word illustration";
const CHAT_FEATURE: &str = "Tutor chat";

/// Vocabulary features backed by one gateway and one provider
pub struct VocabAssistant {
    gateway: Arc<Gateway>,
    provider: SharedProvider,
    word_policy: RetryPolicy,
    image_policy: RetryPolicy,
}

impl VocabAssistant {
    pub fn new(gateway: Arc<Gateway>, provider: SharedProvider) -> Self {
        Self {
            gateway,
            provider,
            word_policy: RetryPolicy::word_details(),
            image_policy: RetryPolicy::image(),
        }
    }

    pub fn with_policies(mut self, word_policy: RetryPolicy, image_policy: RetryPolicy) -> Self {
        self.word_policy = word_policy;
        self.image_policy = image_policy;
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Definition, examples and related words for `word`.
    ///
    /// Incomplete details are retried; if every attempt is incomplete the
    /// last partial result is returned.
    pub async fn word_details(&self, word: &str) -> Option<WordDetails> {
        let word = word.trim();
        let prompt = word_details_prompt(word);
        let schema = WordDetails::response_schema();
        let provider = &self.provider;
        let (prompt, schema) = (&prompt, &schema);

        let outcome = self
            .gateway
            .execute_checked(
                || async move {
                    let value = provider.generate_json(prompt, schema).await?;
                    let mut details: WordDetails = serde_json::from_value(value)?;
                    if details.word.trim().is_empty() {
                        details.word = word.to_string();
                    }
                    if !details.is_complete() {
                        debug!(missing = ?details.missing_fields(), "Word details incomplete");
                    }
                    Ok::<_, ServiceError>(details)
                },
                &self.word_policy,
                WORD_DETAILS_FEATURE,
                WordDetails::is_complete,
                IncompleteFallback::ReturnPartial,
            )
            .await;

        outcome.into_option()
    }

    /// One illustration for `word`; empty images are retried, then dropped
    pub async fn word_image(&self, word: &str) -> Option<GeneratedImage> {
        let prompt = word_image_prompt(word.trim());
        let provider = &self.provider;
        let prompt = &prompt;

        self.gateway
            .execute_checked(
                || async move { provider.generate_image(prompt).await },
                &self.image_policy,
                WORD_IMAGE_FEATURE,
                |image: &GeneratedImage| !image.is_empty(),
                IncompleteFallback::Discard,
            )
            .await
            .into_option()
    }

    /// Stream a tutor reply, forwarding each chunk to `on_chunk`.
    ///
    /// Not retried. Returns the full reply, or `None` on any failure.
    pub async fn chat(
        &self,
        history: &[ChatMessage],
        message: &str,
        mut on_chunk: impl FnMut(&str),
    ) -> Option<String> {
        let context = FeatureName::from(CHAT_FEATURE);
        if !self.gateway.cooldown().try_acquire() {
            self.gateway.reject_cooling_down(&context);
            return None;
        }

        let _loading = self.gateway.begin_loading();

        match self.stream_reply(history, message, &mut on_chunk).await {
            Ok(reply) => {
                info!(chars = reply.len(), "Tutor reply complete");
                Some(reply)
            }
            Err(err) => {
                if ErrorClassifier::classify(&err).trips_cooldown() {
                    self.gateway.cooldown().trip(Some(&context));
                } else {
                    self.gateway.notifier().notify(
                        &format!("{} failed: {}", context, err.message),
                        NotifyLevel::Error,
                    );
                }
                None
            }
        }
    }

    async fn stream_reply(
        &self,
        history: &[ChatMessage],
        message: &str,
        on_chunk: &mut impl FnMut(&str),
    ) -> Result<String, ServiceError> {
        let mut stream = self.provider.stream_chat(history, message).await?;
        let mut reply = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            on_chunk(&chunk);
            reply.push_str(&chunk);
        }
        Ok(reply)
    }
}

fn word_details_prompt(word: &str) -> String {
    format!(
        "Explain the English word \"{word}\" for a language learner. \
         Return JSON with: word, definition (one clear sentence), partOfSpeech, \
         pronunciation (IPA), examples (2-3 natural sentences using the word), \
         synonyms, antonyms, etymology (one sentence) and mnemonic (a short memory hook)."
    )
}

fn word_image_prompt(word: &str) -> String {
    format!(
        "A simple, colorful flat illustration that depicts the meaning of the word \"{word}\". \
         No text or letters in the image."
    )
}
