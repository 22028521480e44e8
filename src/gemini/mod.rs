//! Gemini model boundary
//!
//! Wire types and the HTTP client implementing `ModelBackend`.

pub mod api_client;
pub mod types;

pub use api_client::GeminiClient;
