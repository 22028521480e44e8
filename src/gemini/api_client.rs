//! Gemini API client
//!
//! Direct HTTP client for the `generateContent` endpoint. Implements
//! `ModelBackend`, so the tutor never sees transport details: every failure
//! is classified into an `AppError` variant here.

use crate::config::GeminiConfig;
use crate::error::AppError;
use crate::gemini::types::{
    GeminiApiRequest, GeminiApiResponse, GeminiErrorEnvelope, GenerationConfig, InlineData,
    RequestContent, RequestPart,
};
use crate::tutor::request::{ModelBackend, ModelRequest, ResponseFormat};
use crate::tutor::types::ChatRole;
use async_trait::async_trait;

/// HTTP client for the Gemini API
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("configured", &self.is_configured())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client from configuration.
    ///
    /// A missing key is not an error here; each call then fails with
    /// `ConfigurationMissing`.
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Whether an API key is available
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

/// Translate a tutor request into the wire format
fn build_request(request: &ModelRequest) -> GeminiApiRequest {
    let mut contents: Vec<RequestContent> = request
        .history
        .iter()
        .filter(|message| !message.text.trim().is_empty())
        .map(|message| RequestContent {
            role: Some(role_name(message.role).to_string()),
            parts: vec![RequestPart::Text {
                text: message.text.clone(),
            }],
        })
        .collect();

    let mut parts = vec![RequestPart::Text {
        text: request.prompt.clone(),
    }];
    if let Some(image) = &request.image {
        parts.push(RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
    }
    contents.push(RequestContent {
        role: Some("user".to_string()),
        parts,
    });

    let settings = &request.settings;
    let (response_mime_type, response_schema) = match &settings.response_format {
        ResponseFormat::Text => (None, None),
        ResponseFormat::Json(schema) => (Some("application/json".to_string()), schema.clone()),
    };

    GeminiApiRequest {
        contents,
        system_instruction: settings.system_instruction.as_ref().map(|text| RequestContent {
            role: None,
            parts: vec![RequestPart::Text { text: text.clone() }],
        }),
        generation_config: Some(GenerationConfig {
            temperature: Some(settings.temperature),
            top_p: Some(settings.top_p),
            response_mime_type,
            response_schema,
        }),
    }
}

/// Map a non-success HTTP status onto the error taxonomy
fn classify_status(status: u16, body: &str) -> AppError {
    let envelope = serde_json::from_str::<GeminiErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .unwrap_or_else(|| body.chars().take(500).collect());
    let key_rejected = body.contains("API_KEY_INVALID")
        || body.contains("API key not valid")
        || envelope
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .is_some_and(|s| s == "UNAUTHENTICATED" || s == "PERMISSION_DENIED");

    match status {
        401 | 403 => AppError::InvalidCredential(message),
        400 if key_rejected => AppError::InvalidCredential(message),
        429 => AppError::QuotaExceeded(message),
        500..=599 => AppError::ServiceUnavailable(format!("HTTP {}: {}", status, message)),
        _ => AppError::InvalidInput(format!("Gemini API rejected the request (HTTP {}): {}", status, message)),
    }
}

/// Pull the answer text out of a parsed response
fn extract_text(parsed: &GeminiApiResponse) -> Result<String, AppError> {
    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(AppError::EmptyResponse(format!(
            "the prompt was blocked ({})",
            reason
        )));
    }

    let candidate = parsed.candidates.first().ok_or_else(|| {
        AppError::EmptyResponse("the response contains no candidates".to_string())
    })?;

    match parsed.first_text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::EmptyResponse(format!(
            "the response contains no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))),
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::ConfigurationMissing("GEMINI_API_KEY is not set".to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, request.model, api_key
        );
        let body = build_request(request);

        tracing::debug!(
            operation = %request.operation,
            model = %request.model,
            prompt_len = request.prompt.len(),
            json_mode = !matches!(request.settings.response_format, ResponseFormat::Text),
            "Calling Gemini API"
        );

        // Shared client for connection pooling
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!(error = %e, "Failed to reach Gemini API");
                AppError::ServiceUnavailable(format!("failed to reach Gemini API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            tracing::error!(
                status_code = status.as_u16(),
                error_body = %error_body,
                "Gemini API returned error status"
            );
            return Err(classify_status(status.as_u16(), &error_body));
        }

        let response_body = response.text().await.map_err(|e| {
            AppError::ServiceUnavailable(format!(
                "failed to read Gemini API response: {}",
                e.without_url()
            ))
        })?;

        let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
            AppError::MalformedResponse(format!("Gemini API response is not valid JSON: {}", e))
        })?;

        let text = extract_text(&parsed)?;
        tracing::debug!(
            response_len = text.len(),
            "Successfully received response from Gemini API"
        );
        Ok(text)
    }
}
