//! Vocabulary payloads exchanged with the generative-language service.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// AI-generated details for a vocabulary word
///
/// Every field defaults so that a partially filled response still
/// deserializes; completeness is checked separately with [`WordDetails::missing_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WordDetails {
    pub word: String,
    pub definition: String,
    pub part_of_speech: String,
    pub pronunciation: Option<String>,
    pub examples: Vec<String>,
    pub synonyms: Vec<String>,
    pub antonyms: Vec<String>,
    pub etymology: Option<String>,
    pub mnemonic: Option<String>,
}

impl WordDetails {
    /// Required fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.definition.trim().is_empty() {
            missing.push("definition");
        }
        if self.part_of_speech.trim().is_empty() {
            missing.push("partOfSpeech");
        }
        if !self.examples.iter().any(|e| !e.trim().is_empty()) {
            missing.push("examples");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Response schema sent with JSON-mode generation requests
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "word": {"type": "STRING"},
                "definition": {"type": "STRING"},
                "partOfSpeech": {"type": "STRING"},
                "pronunciation": {"type": "STRING"},
                "examples": {"type": "ARRAY", "items": {"type": "STRING"}},
                "synonyms": {"type": "ARRAY", "items": {"type": "STRING"}},
                "antonyms": {"type": "ARRAY", "items": {"type": "STRING"}},
                "etymology": {"type": "STRING"},
                "mnemonic": {"type": "STRING"}
            },
            "required": ["word", "definition", "partOfSpeech", "examples"]
        })
    }
}

/// Image produced by the image-generation model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data_base64: String,
}

impl GeneratedImage {
    pub fn is_empty(&self) -> bool {
        self.data_base64.trim().is_empty()
    }

    /// `data:` URL suitable for embedding in a flashcard
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of the tutor conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_details_deserialize() {
        let details: WordDetails =
            serde_json::from_value(json!({"word": "ephemeral", "definition": "short-lived"}))
                .unwrap();
        assert_eq!(details.word, "ephemeral");
        assert_eq!(details.missing_fields(), vec!["partOfSpeech", "examples"]);
        assert!(!details.is_complete());
    }

    #[test]
    fn test_complete_details() {
        let details = WordDetails {
            word: "laconic".into(),
            definition: "using few words".into(),
            part_of_speech: "adjective".into(),
            examples: vec!["His laconic reply ended the debate.".into()],
            ..Default::default()
        };
        assert!(details.is_complete());
    }

    #[test]
    fn test_blank_examples_are_missing() {
        let details = WordDetails {
            definition: "x".into(),
            part_of_speech: "noun".into(),
            examples: vec!["  ".into()],
            ..Default::default()
        };
        assert_eq!(details.missing_fields(), vec!["examples"]);
    }

    #[test]
    fn test_image_data_url() {
        let image = GeneratedImage {
            mime_type: "image/png".into(),
            data_base64: "AAAA".into(),
        };
        assert_eq!(image.data_url(), "data:image/png;base64,AAAA");
        assert!(!image.is_empty());
    }
}
