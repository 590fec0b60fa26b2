//! Gemini API Provider
//!
//! Client for the generative-language REST API: JSON-mode `generateContent`,
//! Imagen `predict`, and SSE `streamGenerateContent` for the tutor chat.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{AiProvider, ChatStream, SseDecoder};
use crate::ai::json::extract_json;
use crate::config::GeminiConfig;
use crate::constants::gemini as gemini_constants;
use crate::types::{
    ChatMessage, ChatRole, GeneratedImage, Result, ServiceError, WordwiseError,
};

const TUTOR_INSTRUCTION: &str = "You are a friendly vocabulary tutor. Explain words simply, \
give short example sentences, and quiz the learner when they ask for practice.";

/// Gemini API provider with secure API key handling
pub struct GeminiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: Url,
    model: String,
    image_model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base.as_str())
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(gemini_constants::API_KEY_ENV).ok())
            .ok_or_else(|| {
                WordwiseError::config(format!(
                    "Gemini API key not found. Set {} or gemini.api_key in config",
                    gemini_constants::API_KEY_ENV
                ))
            })?;

        // Trailing slash so Url::join appends instead of replacing the last segment
        let base = format!("{}/", config.api_base.trim_end_matches('/'));
        let api_base = Url::parse(&base)
            .map_err(|e| WordwiseError::config(format!("Invalid gemini.api_base: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WordwiseError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            model: config.model,
            image_model: config.image_model,
            temperature: config.temperature,
            client,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> std::result::Result<Url, ServiceError> {
        self.api_base
            .join(&format!("models/{}:{}", model, method))
            .map_err(|e| ServiceError::new(format!("Invalid endpoint for {}: {}", model, e)))
    }

    async fn post<B: Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> std::result::Result<reqwest::Response, ServiceError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::from_http(status, &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    async fn generate_json(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> std::result::Result<Value, ServiceError> {
        info!(model = %self.model, "Generating JSON with Gemini");
        let start = Instant::now();

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
                response_mime_type: Some("application/json".to_string()),
                response_schema: (!schema.is_null()).then(|| schema.clone()),
            }),
        };

        let response = self
            .post(self.endpoint(&self.model, "generateContent")?, &request)
            .await?;
        let body: GenerateContentResponse = response.json().await?;

        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Gemini responded");

        let text = body.text()?;
        if text.trim().is_empty() {
            return Err(ServiceError::new("No content in Gemini response"));
        }
        extract_json(&text)
    }

    async fn generate_image(
        &self,
        prompt: &str,
    ) -> std::result::Result<GeneratedImage, ServiceError> {
        info!(model = %self.image_model, "Generating image with Imagen");

        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "1:1".to_string(),
            },
        };

        let response = self
            .post(self.endpoint(&self.image_model, "predict")?, &request)
            .await?;
        let body: PredictResponse = response.json().await?;

        let image = body
            .predictions
            .into_iter()
            .find_map(|p| {
                p.bytes_base64_encoded.map(|data| GeneratedImage {
                    mime_type: p.mime_type.unwrap_or_else(|| "image/png".to_string()),
                    data_base64: data,
                })
            })
            .unwrap_or_else(|| GeneratedImage {
                mime_type: "image/png".to_string(),
                data_base64: String::new(),
            });

        Ok(image)
    }

    async fn stream_chat(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> std::result::Result<ChatStream, ServiceError> {
        info!(model = %self.model, turns = history.len(), "Starting tutor chat stream");

        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
        contents.push(Content::user(message));

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(TUTOR_INSTRUCTION)],
            }),
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
                response_mime_type: None,
                response_schema: None,
            }),
        };

        let mut url = self.endpoint(&self.model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let response = self.post(url, &request).await?;
        Ok(chat_stream(response))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

struct StreamState {
    response: reqwest::Response,
    decoder: SseDecoder,
    pending: VecDeque<std::result::Result<String, ServiceError>>,
    done: bool,
}

fn chat_stream(response: reqwest::Response) -> ChatStream {
    let state = StreamState {
        response,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            let events = match st.response.chunk().await {
                Ok(Some(bytes)) => st.decoder.push(&bytes),
                Ok(None) => {
                    st.done = true;
                    st.decoder.finish()
                }
                Err(e) => {
                    st.done = true;
                    st.pending.push_back(Err(e.into()));
                    Vec::new()
                }
            };
            for event in events {
                if let Some(item) = parse_stream_event(&event) {
                    st.pending.push_back(item);
                }
            }
        }
    })
    .boxed()
}

/// Text of one streamed event; `None` for events without text
fn parse_stream_event(data: &str) -> Option<std::result::Result<String, ServiceError>> {
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => return Some(Err(e.into())),
    };
    if value.get("error").is_some() {
        return Some(Err(ServiceError::from_value(&value)));
    }
    match serde_json::from_value::<GenerateContentResponse>(value) {
        Ok(chunk) => match chunk.text() {
            Ok(text) if text.is_empty() => None,
            other => Some(other),
        },
        Err(e) => Some(Err(e.into())),
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }
}

impl From<&ChatMessage> for Content {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![Part::text(&message.text)],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> std::result::Result<String, ServiceError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ServiceError::new(format!("Prompt blocked by the service: {}", reason)));
        }

        Ok(self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize, Default)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(GeminiConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-key"));
    }

    #[test]
    fn test_endpoint_keeps_version_segment() {
        let url = provider()
            .endpoint("gemini-2.5-flash", "generateContent")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }))
        .unwrap();
        assert_eq!(body.text().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let body: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(body.text().unwrap_err().message.contains("SAFETY"));
    }

    #[test]
    fn test_stream_event_parsing() {
        let text = parse_stream_event(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}]}}]}"#,
        );
        assert_eq!(text, Some(Ok("Hel".to_string())));

        assert_eq!(parse_stream_event(r#"{"candidates":[]}"#), None);

        let err = parse_stream_event(
            r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        match err {
            Some(Err(e)) => assert_eq!(e.status_code, Some(429)),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![Content::from(&ChatMessage::model("hi"))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: 0.5,
                response_mime_type: Some("application/json".to_string()),
                response_schema: None,
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "model");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(value.get("systemInstruction").is_none());
    }
}
