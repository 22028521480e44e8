//! Integration tests for the tutor facade over the Gemini client
//!
//! These tests verify the complete request pipeline against a mock server:
//! 1. Model resolution (heuristic and explicit override)
//! 2. Wire request shape
//! 3. Validation and normalisation of the reply
//! 4. Error classification

use code_tutor::config::{GeminiConfig, ModelCatalog, TimeoutConfig};
use code_tutor::error::AppError;
use code_tutor::gemini::GeminiClient;
use code_tutor::tutor::{
    Difficulty, Language, ModelPreference, PracticeQuestion, Tutor, TutorConfig,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;

fn tutor_for(server: &ServerGuard) -> Tutor {
    let client = GeminiClient::new(&GeminiConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.url(),
    });
    Tutor::new(
        Arc::new(client),
        ModelCatalog::default(),
        TimeoutConfig::default(),
    )
}

/// Wrap model text in a generateContent response envelope
fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn practice(solution: &str) -> Value {
    json!({
        "questionText": "Print a greeting",
        "instructions": ["Call print", "Pass a string"],
        "solutionCode": solution,
        "solutionOutput": "hi\n"
    })
}

fn analysis_reply() -> String {
    json!({
        "topicExplanation": {
            "coreConcepts": "Printing to standard output",
            "blockByBlockBreakdown": "A single statement",
            "lineByLineBreakdown": "Line 1 calls print",
            "executionFlow": "Runs top to bottom once",
            "visualExecutionTrace": [{
                "lineNumber": 1,
                "explanation": "print writes hi",
                "variablesState": {},
                "consoleOutput": "hi\n"
            }]
        },
        "exampleCode": "name = 'Ada'\nprint('hello', name)",
        "exampleCodeOutput": "hello Ada\n",
        "practiceContext": {
            "generatedPractice": practice("print('bye')"),
            "userCodeAsPractice": practice("print('something else')")
        },
        "detectedLanguage": "python"
    })
    .to_string()
}

#[tokio::test]
#[serial]
async fn test_easy_snippet_analysis_end_to_end() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .with_status(200)
        .with_body(envelope(&format!("```json\n{}\n```", analysis_reply())))
        .create_async()
        .await;

    let result = tutor_for(&server)
        .analyze_code(
            "print('hi')\n",
            Language::Unknown,
            Difficulty::Easy,
            &TutorConfig::default(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.language, Language::Python);
    assert_ne!(result.example_code.trim(), "print('hi')");
    assert_eq!(
        result.practice_context.user_code_as_practice.solution_code,
        "print('hi')\n"
    );
    assert_eq!(result.topic_explanation.visual_execution_trace.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_explicit_model_overrides_heuristic() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/my-custom-model:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_body(envelope("Closures capture their environment."))
        .create_async()
        .await;

    let config = TutorConfig {
        model_preference: ModelPreference::Custom("my-custom-model".to_string()),
        ..TutorConfig::default()
    };
    let answer = tutor_for(&server)
        .ask_followup(
            "function outer() { let x = 1; return () => x; }",
            Language::JavaScript,
            &[],
            "What is a closure?",
            &config,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(answer, "Closures capture their environment.");
}

#[tokio::test]
#[serial]
async fn test_long_input_escalates_to_advanced_model() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-pro:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(
            &json!({
                "summary": "No errors found",
                "errors": [],
                "correctedCode": "x = 1"
            })
            .to_string(),
        ))
        .create_async()
        .await;

    let code = "x = 1\n".repeat(60);
    let result = tutor_for(&server)
        .debug_code(&code, Language::Python, None, &TutorConfig::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(result.errors.is_empty());
}

#[tokio::test]
#[serial]
async fn test_quota_exhaustion_is_classified() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let result = tutor_for(&server)
        .get_example_by_difficulty(
            "loops",
            Language::Python,
            Difficulty::Intermediate,
            &TutorConfig::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::QuotaExceeded(_))));
}

#[tokio::test]
#[serial]
async fn test_invalid_reply_shape_is_schema_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(envelope(r#"{"isCorrect": "yes", "feedback": "Looks fine"}"#))
        .create_async()
        .await;

    let question: PracticeQuestion = serde_json::from_value(practice("print('hi')")).unwrap();
    let result = tutor_for(&server)
        .check_user_solution(
            &question,
            "print('hi')",
            Language::Python,
            &TutorConfig::default(),
        )
        .await;

    match result {
        Err(AppError::SchemaValidationFailed(message)) => {
            assert!(message.contains("isCorrect"), "message: {}", message)
        }
        other => panic!("expected schema failure, got {:?}", other),
    }
}
