//! Gemini API wire types
//!
//! Structs that mirror the `generateContent` request and response JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `models/{model}:generateContent`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiRequest {
    /// Conversation turns, oldest first; the last one is the prompt
    pub contents: Vec<RequestContent>,
    /// Custom system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<RequestContent>,
    /// Sampling and output-format settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One turn of a request
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// "user" or "model"; omitted for the system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Parts of the turn
    pub parts: Vec<RequestPart>,
}

/// A text or inline-image part
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum RequestPart {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// Base64 image data
    InlineData {
        /// The image
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Inline binary payload
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload
    pub mime_type: String,
    /// Base64 data
    pub data: String,
}

/// Generation configuration for requests
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus-sampling threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// MIME type to force for the response (e.g. "application/json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// OpenAPI-subset schema constraining JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// Top-level `generateContent` response
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiResponse {
    /// Candidate responses
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt (e.g. if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GeminiApiResponse {
    /// Concatenated text of the first candidate, if any
    pub fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        Some(text)
    }
}

/// A single candidate response
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; absent when generation was stopped early
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content of a candidate
#[derive(Deserialize, Debug)]
pub struct Content {
    /// Parts of the response
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One response part; non-text parts are ignored
#[derive(Deserialize, Debug)]
pub struct Part {
    /// Text content
    #[serde(default)]
    pub text: Option<String>,
}

/// Feedback about the prompt
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses
#[derive(Deserialize, Debug)]
pub struct GeminiErrorEnvelope {
    /// Error details
    pub error: GeminiErrorBody,
}

/// Error details
#[derive(Deserialize, Debug)]
pub struct GeminiErrorBody {
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Canonical status (e.g. "RESOURCE_EXHAUSTED")
    #[serde(default)]
    pub status: Option<String>,
    /// Structured details; carries the reason (e.g. "API_KEY_INVALID")
    #[serde(default)]
    pub details: Vec<Value>,
}
