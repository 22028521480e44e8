//! HTTP-level tests for the router
//!
//! Requests go through the full axum route table; the model is either absent
//! (no API key) or a mock Gemini server.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use code_tutor::api::router;
use code_tutor::config::{GeminiConfig, ModelCatalog, TimeoutConfig};
use code_tutor::gemini::GeminiClient;
use code_tutor::state::AppState;
use code_tutor::tutor::Tutor;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn create_test_router(base_url: &str, api_key: Option<&str>) -> Router {
    let client = GeminiClient::new(&GeminiConfig {
        api_key: api_key.map(str::to_string),
        base_url: base_url.to_string(),
    });
    let configured = client.is_configured();
    let tutor = Tutor::new(
        Arc::new(client),
        ModelCatalog::default(),
        TimeoutConfig::default(),
    );
    router((Arc::new(RwLock::new(AppState::new())), tutor), configured)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_missing_key() {
    let app = create_test_router("http://127.0.0.1:9", None);
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model_configured"], false);
}

#[tokio::test]
async fn test_operation_without_key_is_configuration_missing() {
    let app = create_test_router("http://127.0.0.1:9", None);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/debug",
        Some(json!({"code": "print(1", "language": "python"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "ConfigurationMissing");

    // The submission is still in the history, without a result
    let (_, list) = send(&app, Method::GET, "/api/activities", None).await;
    assert_eq!(list["count"], 1);
    assert!(list["activities"][0]["result"].is_null());
}

#[tokio::test]
async fn test_blank_code_is_bad_request() {
    let app = create_test_router("http://127.0.0.1:9", Some("test-key"));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/execute",
        Some(json!({"code": "   ", "language": "python"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InvalidInput");
}

#[tokio::test]
async fn test_rejected_submissions_leave_history_empty() {
    let app = create_test_router("http://127.0.0.1:9", Some("test-key"));
    let rejected = [
        ("/api/analyze/code", json!({"code": "   "})),
        ("/api/analyze/concept", json!({"concept": "", "language": "python"})),
        ("/api/debug", json!({"code": "\n\t"})),
        ("/api/project/analyze", json!({"project": {"name": "demo", "files": []}})),
        (
            "/api/analyze/code",
            json!({"code": "print(1)", "config": {"temperature": 2.5}}),
        ),
    ];

    for (uri, body) in rejected {
        let (status, error) = send(&app, Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(error["kind"], "InvalidInput");
    }

    let (_, list) = send(&app, Method::GET, "/api/activities", None).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_missing_activity_is_not_found() {
    let app = create_test_router("http://127.0.0.1:9", None);
    let (status, body) = send(&app, Method::GET, "/api/activities/does-not-exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "ActivityNotFound");
}

#[tokio::test]
async fn test_settings_round_trip() {
    let app = create_test_router("http://127.0.0.1:9", None);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/settings",
        Some(json!({"modelPreference": "fast", "defaultDifficulty": "hard"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modelPreference"], "fast");

    let (_, body) = send(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(body["defaultDifficulty"], "hard");

    let (_, list) = send(&app, Method::GET, "/api/activities", None).await;
    assert_eq!(list["activities"][0]["kind"], "settingsUpdate");

    let (status, _) = send(&app, Method::DELETE, "/api/activities", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, list) = send(&app, Method::GET, "/api/activities", None).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
#[serial]
async fn test_debug_round_trip_through_mock_model() {
    let mut server = Server::new_async().await;
    let reply = json!({
        "summary": "Missing closing parenthesis",
        "errors": [{
            "lineNumber": 1,
            "errorLine": "print(1",
            "errorType": "SyntaxError",
            "explanation": "The call is never closed",
            "suggestedFix": "print(1)"
        }],
        "correctedCode": "print(1)"
    });
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{
                    "content": {"parts": [{"text": reply.to_string()}], "role": "model"}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let app = create_test_router(&server.url(), Some("test-key"));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/debug",
        Some(json!({"code": "print(1", "language": "python"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["correctedCode"], "print(1)");
    assert_eq!(body["result"]["errors"][0]["lineNumber"], 1);

    let id = body["activityId"].as_str().unwrap().to_string();
    let (status, item) = send(&app, Method::GET, &format!("/api/activities/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["summary"], "Missing closing parenthesis");
    assert_eq!(item["result"]["type"], "debug");
}
