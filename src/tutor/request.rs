//! Request wrapper around the remote model
//!
//! `ModelBackend` is the only external dependency of the tutor: a prompt
//! (optionally with an image and prior chat turns) plus generation settings
//! goes in, text comes out. `dispatch` races a backend call against a fixed
//! budget and classifies a lost race as `AppError::Timeout`.

use crate::error::AppError;
use crate::tutor::model_policy::OperationKind;
use crate::tutor::types::{ChatMessage, ImageInput};
use async_trait::async_trait;
use base64::Engine as _;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

/// MIME types accepted for image input
pub const SUPPORTED_IMAGE_TYPES: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
    "image/gif",
];

/// Format the model is asked to answer in
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Free text or markdown
    Text,
    /// A JSON document, optionally constrained by a schema
    Json(Option<Value>),
}

/// Generation settings for one call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling threshold
    pub top_p: f32,
    /// Custom system instruction
    pub system_instruction: Option<String>,
    /// Requested response format
    pub response_format: ResponseFormat,
}

/// An image embedded in a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type
    pub mime_type: String,
    /// Base64 payload (no data-URL prefix)
    pub data: String,
}

impl InlineImage {
    /// Validate caller-supplied image data.
    ///
    /// Accepts either a bare base64 payload with an explicit MIME type or a
    /// `data:<mime>;base64,<payload>` URL.
    pub fn from_input(input: &ImageInput) -> Result<Self, AppError> {
        let raw = input.data.trim();
        let (url_mime, payload) = match raw.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    AppError::InvalidInput("Image data URL has no payload".to_string())
                })?;
                let mime = header.strip_suffix(";base64").ok_or_else(|| {
                    AppError::InvalidInput("Image data URL must be base64 encoded".to_string())
                })?;
                (Some(mime.to_string()), payload)
            }
            None => (None, raw),
        };

        let mime_type = input
            .mime_type
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or(url_mime)
            .ok_or_else(|| AppError::InvalidInput("Image MIME type is missing".to_string()))?
            .trim()
            .to_lowercase();

        if !SUPPORTED_IMAGE_TYPES.contains(&mime_type.as_str()) {
            return Err(AppError::InvalidInput(format!(
                "Unsupported image type: {}",
                mime_type
            )));
        }

        let data: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if data.is_empty() {
            return Err(AppError::InvalidInput("Image data is empty".to_string()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(&data)
            .map_err(|e| AppError::InvalidInput(format!("Image data is not valid base64: {}", e)))?;

        Ok(Self { mime_type, data })
    }
}

/// Everything the backend needs for one call
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Operation being served (for logging)
    pub operation: OperationKind,
    /// Model identifier
    pub model: String,
    /// Prompt for the final user turn
    pub prompt: String,
    /// Optional image attached to the final user turn
    pub image: Option<InlineImage>,
    /// Earlier conversation turns, oldest first
    pub history: Vec<ChatMessage>,
    /// Generation settings
    pub settings: GenerationSettings,
}

/// The remote generative model
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send one request and return the raw response text
    async fn generate(&self, request: &ModelRequest) -> Result<String, AppError>;
}

/// Run one backend call with a hard time budget.
///
/// A single attempt is made; there are no retries. Blank text is reported as
/// `EmptyResponse`.
pub async fn dispatch(
    backend: &dyn ModelBackend,
    request: &ModelRequest,
    budget: Duration,
) -> Result<String, AppError> {
    tracing::debug!(
        operation = %request.operation,
        model = %request.model,
        prompt_len = request.prompt.len(),
        has_image = request.image.is_some(),
        history_len = request.history.len(),
        timeout_secs = budget.as_secs(),
        "Dispatching model request"
    );

    let text = match timeout(budget, backend.generate(request)).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::error!(
                operation = %request.operation,
                model = %request.model,
                timeout_secs = budget.as_secs(),
                "Model request timed out"
            );
            return Err(AppError::Timeout(budget.as_secs()));
        }
    };

    if text.trim().is_empty() {
        return Err(AppError::EmptyResponse(format!(
            "{} returned no text",
            request.operation
        )));
    }

    tracing::debug!(
        operation = %request.operation,
        response_len = text.len(),
        "Model request completed"
    );
    Ok(text)
}

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "python", ...) on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse model text as JSON.
///
/// Tolerates markdown fences and leading/trailing prose around a single
/// JSON document.
pub fn parse_json_payload(text: &str) -> Result<Value, AppError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(AppError::EmptyResponse(
            "response contained no JSON".to_string(),
        ));
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            let start = body.find(|c: char| c == '{' || c == '[');
            let end = body.rfind(|c: char| c == '}' || c == ']');
            if let (Some(start), Some(end)) = (start, end) {
                if start < end {
                    if let Ok(value) = serde_json::from_str::<Value>(&body[start..=end]) {
                        tracing::warn!("Recovered JSON document embedded in surrounding text");
                        return Ok(value);
                    }
                }
            }
            Err(AppError::MalformedResponse(format!(
                "response is not valid JSON: {}",
                first_error
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::types::ImageInput;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct PendingBackend;

    #[async_trait]
    impl ModelBackend for PendingBackend {
        async fn generate(&self, _request: &ModelRequest) -> Result<String, AppError> {
            std::future::pending::<Result<String, AppError>>().await
        }
    }

    struct DelayedBackend {
        delay: Duration,
        text: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelBackend for DelayedBackend {
        async fn generate(&self, _request: &ModelRequest) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.text.clone())
        }
    }

    fn request() -> ModelRequest {
        ModelRequest {
            operation: OperationKind::AskFollowup,
            model: "gemini-2.5-flash".to_string(),
            prompt: "hello".to_string(),
            image: None,
            history: vec![],
            settings: GenerationSettings {
                temperature: 0.7,
                top_p: 0.95,
                system_instruction: None,
                response_format: ResponseFormat::Text,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_times_out_at_budget() {
        let budget = Duration::from_secs(30);
        let started = tokio::time::Instant::now();
        let result = dispatch(&PendingBackend, &request(), budget).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(AppError::Timeout(30))));
        assert!(elapsed >= budget, "timed out early: {:?}", elapsed);
        assert!(elapsed < budget + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_completes_before_budget() {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = DelayedBackend {
            delay: Duration::from_secs(29),
            text: "answer".to_string(),
            calls: calls.clone(),
        };
        let result = dispatch(&backend, &request(), Duration::from_secs(30)).await;
        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_makes_a_single_attempt_on_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = DelayedBackend {
            delay: Duration::from_secs(60),
            text: "late".to_string(),
            calls: calls.clone(),
        };
        let result = dispatch(&backend, &request(), Duration::from_secs(10)).await;
        assert!(matches!(result, Err(AppError::Timeout(10))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_blank_text_is_empty_response() {
        let backend = DelayedBackend {
            delay: Duration::from_millis(0),
            text: "  \n".to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let result = dispatch(&backend, &request(), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(AppError::EmptyResponse(_))));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\nprint(1)\n```"), "print(1)");
    }

    #[test]
    fn test_parse_json_payload_variants() {
        assert_eq!(parse_json_payload("{\"a\": 1}").unwrap(), json!({"a": 1}));
        assert_eq!(
            parse_json_payload("```json\n[{\"a\": 1}]\n```").unwrap(),
            json!([{"a": 1}])
        );
        assert_eq!(
            parse_json_payload("Here you go:\n{\"a\": 2}\nEnjoy!").unwrap(),
            json!({"a": 2})
        );
    }

    #[test]
    fn test_parse_json_payload_errors() {
        assert!(matches!(
            parse_json_payload("not json at all"),
            Err(AppError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_json_payload("```json\n```"),
            Err(AppError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_inline_image_from_data_url() {
        let image = InlineImage::from_input(&ImageInput {
            mime_type: None,
            data: "data:image/png;base64,aGVsbG8=".to_string(),
        })
        .unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[test]
    fn test_inline_image_rejects_bad_input() {
        let bad_base64 = InlineImage::from_input(&ImageInput {
            mime_type: Some("image/png".to_string()),
            data: "%%%".to_string(),
        });
        assert!(matches!(bad_base64, Err(AppError::InvalidInput(_))));

        let bad_type = InlineImage::from_input(&ImageInput {
            mime_type: Some("application/pdf".to_string()),
            data: "aGVsbG8=".to_string(),
        });
        assert!(matches!(bad_type, Err(AppError::InvalidInput(_))));

        let missing_type = InlineImage::from_input(&ImageInput {
            mime_type: None,
            data: "aGVsbG8=".to_string(),
        });
        assert!(matches!(missing_type, Err(AppError::InvalidInput(_))));
    }
}
