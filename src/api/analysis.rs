//! Analysis API
//!
//! Code, concept, debug and image submissions. Each one records a pending
//! activity, runs the tutor operation and attaches the result.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::utils::{
    complete_activity, log_failure, parse_language, record_activity, resolve_config,
    resolve_difficulty, ActivityResponse, RouterState,
};
use crate::error::AppError;
use crate::state::{ActivityItem, ActivityKind, ActivityResult};
use crate::tutor::{
    require_language, require_text, AnalysisResult, DebugResult, Difficulty, ExtractedCode,
    ImageInput, TutorConfig,
};

/// Where submitted code came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSource {
    /// Pasted into the editor
    #[default]
    Paste,
    /// Uploaded as a file
    File,
}

/// Request body for POST /api/analyze/code
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeCodeRequest {
    /// Source code
    pub code: String,
    /// Language name; omitted or unrecognised means "detect"
    #[serde(default)]
    pub language: Option<String>,
    /// Difficulty of generated examples and practice
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Paste or file upload
    #[serde(default)]
    pub source: CodeSource,
    /// Uploaded file name
    #[serde(default)]
    pub file_name: Option<String>,
    /// Per-call configuration; defaults to the saved settings
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for POST /api/analyze/concept
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeConceptRequest {
    /// Concept described in prose
    pub concept: String,
    /// Language to teach it in
    pub language: String,
    /// Difficulty of generated examples and practice
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for POST /api/debug
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRequest {
    /// Source code
    pub code: String,
    /// Language name; omitted means "detect"
    #[serde(default)]
    pub language: Option<String>,
    /// What the learner observed
    #[serde(default)]
    pub problem: Option<String>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for POST /api/image/extract
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    /// The image
    pub image: ImageInput,
    /// Also analyse the transcribed code
    #[serde(default)]
    pub analyze: bool,
    /// Difficulty used when analysing
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Response for POST /api/image/extract
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    /// Transcribed code
    pub extracted: ExtractedCode,
    /// Activity holding the analysis, when one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    /// Analysis of the transcribed code, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

/// POST /api/analyze/code - Explain submitted code
pub async fn analyze_code(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<AnalyzeCodeRequest>,
) -> Result<Json<ActivityResponse<AnalysisResult>>, AppError> {
    require_text(&request.code, "code")?;
    let config = resolve_config(&app_state, request.config).await?;
    let difficulty = resolve_difficulty(&app_state, request.difficulty).await;
    let language = parse_language(request.language.as_deref());

    let kind = match request.source {
        CodeSource::File => ActivityKind::FileAnalysis,
        CodeSource::Paste => ActivityKind::PasteAnalysis,
    };
    let mut item = ActivityItem::new(kind, request.code.clone(), language, Some(difficulty));
    if let (CodeSource::File, Some(name)) = (request.source, &request.file_name) {
        item = item.with_title_subject(name);
    }
    let activity_id = record_activity(&app_state, item).await?;

    let result = tutor
        .analyze_code(&request.code, language, difficulty, &config)
        .await
        .map_err(|e| {
            log_failure(&activity_id, "analyze_code", &e);
            e
        })?;

    complete_activity(&app_state, &activity_id, ActivityResult::Analysis(result.clone())).await?;
    Ok(Json(ActivityResponse {
        activity_id,
        result,
    }))
}

/// POST /api/analyze/concept - Explain a concept
pub async fn analyze_concept(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<AnalyzeConceptRequest>,
) -> Result<Json<ActivityResponse<AnalysisResult>>, AppError> {
    let language = parse_language(Some(&request.language));
    require_text(&request.concept, "concept")?;
    require_language(language)?;
    let config = resolve_config(&app_state, request.config).await?;
    let difficulty = resolve_difficulty(&app_state, request.difficulty).await;

    let activity_id = record_activity(
        &app_state,
        ActivityItem::new(
            ActivityKind::ConceptAnalysis,
            request.concept.clone(),
            language,
            Some(difficulty),
        ),
    )
    .await?;

    let result = tutor
        .analyze_concept(&request.concept, language, difficulty, &config)
        .await
        .map_err(|e| {
            log_failure(&activity_id, "analyze_concept", &e);
            e
        })?;

    complete_activity(&app_state, &activity_id, ActivityResult::Analysis(result.clone())).await?;
    Ok(Json(ActivityResponse {
        activity_id,
        result,
    }))
}

/// POST /api/debug - Find and fix errors
pub async fn debug_code(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<DebugRequest>,
) -> Result<Json<ActivityResponse<DebugResult>>, AppError> {
    require_text(&request.code, "code")?;
    let config = resolve_config(&app_state, request.config).await?;
    let language = parse_language(request.language.as_deref());

    let activity_id = record_activity(
        &app_state,
        ActivityItem::new(ActivityKind::DebugAnalysis, request.code.clone(), language, None),
    )
    .await?;

    let result = tutor
        .debug_code(&request.code, language, request.problem.as_deref(), &config)
        .await
        .map_err(|e| {
            log_failure(&activity_id, "debug_code", &e);
            e
        })?;

    complete_activity(&app_state, &activity_id, ActivityResult::Debug(result.clone())).await?;
    Ok(Json(ActivityResponse {
        activity_id,
        result,
    }))
}

/// POST /api/image/extract - Transcribe code from an image, optionally analysing it
pub async fn extract_image(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let extracted = tutor.extract_code_from_image(&request.image, &config).await?;

    if !request.analyze {
        return Ok(Json(ImageResponse {
            extracted,
            activity_id: None,
            analysis: None,
        }));
    }

    let difficulty = resolve_difficulty(&app_state, request.difficulty).await;
    let image_ref = format!(
        "{} image, {} base64 chars",
        request.image.mime_type.as_deref().unwrap_or("inline"),
        request.image.data.len()
    );
    let activity_id = record_activity(
        &app_state,
        ActivityItem::new(
            ActivityKind::ImageAnalysis,
            extracted.code.clone(),
            extracted.language,
            Some(difficulty),
        )
        .with_image_ref(image_ref),
    )
    .await?;

    let analysis = tutor
        .analyze_code(&extracted.code, extracted.language, difficulty, &config)
        .await
        .map_err(|e| {
            log_failure(&activity_id, "analyze_code", &e);
            e
        })?;

    complete_activity(&app_state, &activity_id, ActivityResult::Analysis(analysis.clone())).await?;
    Ok(Json(ImageResponse {
        extracted,
        activity_id: Some(activity_id),
        analysis: Some(analysis),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::tutor::testing::{scripted_tutor, ScriptedBackend};
    use crate::tutor::Language;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn router_state(backend: Arc<ScriptedBackend>) -> RouterState {
        (Arc::new(RwLock::new(AppState::new())), scripted_tutor(backend))
    }

    fn debug_reply() -> String {
        json!({
            "summary": "Unclosed call",
            "errors": [{"errorLine": "print(1", "errorType": "SyntaxError",
                        "explanation": "missing )", "suggestedFix": "print(1)"}],
            "correctedCode": "print(1)",
            "detectedLanguage": "python"
        })
        .to_string()
    }

    fn analysis_reply() -> String {
        let practice = json!({
            "questionText": "Print a greeting",
            "instructions": ["Call print"],
            "solutionCode": "print('hi')",
            "solutionOutput": "hi\n"
        });
        json!({
            "topicExplanation": {
                "coreConcepts": "Functions",
                "blockByBlockBreakdown": "One function",
                "lineByLineBreakdown": "Line 1 defines main",
                "executionFlow": "Nothing runs",
                "visualExecutionTrace": []
            },
            "exampleCode": "def greet():\n    print('hi')",
            "exampleCodeOutput": "",
            "practiceContext": {
                "generatedPractice": practice,
                "userCodeAsPractice": practice
            },
            "detectedLanguage": "python"
        })
        .to_string()
    }

    fn code_request(code: &str) -> AnalyzeCodeRequest {
        AnalyzeCodeRequest {
            code: code.to_string(),
            language: None,
            difficulty: None,
            source: CodeSource::Paste,
            file_name: None,
            config: None,
        }
    }

    #[tokio::test]
    async fn test_uploaded_file_is_titled_by_name() {
        let state = router_state(ScriptedBackend::replying(vec![Ok(analysis_reply())]));
        let response = analyze_code(
            State(state.clone()),
            Json(AnalyzeCodeRequest {
                source: CodeSource::File,
                file_name: Some("main.py".to_string()),
                ..code_request("def main():\n    pass\n")
            }),
        )
        .await
        .unwrap()
        .0;

        let app_state = state.0.read().await;
        let item = app_state.activities().get(&response.activity_id).unwrap();
        assert_eq!(item.kind, ActivityKind::FileAnalysis);
        assert_eq!(item.title, "File: main.py");
        assert_eq!(item.input, "def main():\n    pass\n");
    }

    #[tokio::test]
    async fn test_blank_submissions_record_nothing() {
        let backend = ScriptedBackend::replying(vec![]);
        let state = router_state(backend.clone());

        let code = analyze_code(State(state.clone()), Json(code_request("   "))).await;
        assert!(matches!(code, Err(AppError::InvalidInput(_))));

        let concept = analyze_concept(
            State(state.clone()),
            Json(AnalyzeConceptRequest {
                concept: "\n".to_string(),
                language: "python".to_string(),
                difficulty: None,
                config: None,
            }),
        )
        .await;
        assert!(matches!(concept, Err(AppError::InvalidInput(_))));

        let debug = debug_code(
            State(state.clone()),
            Json(DebugRequest {
                code: String::new(),
                language: None,
                problem: None,
                config: None,
            }),
        )
        .await;
        assert!(matches!(debug, Err(AppError::InvalidInput(_))));

        assert!(state.0.read().await.activities().is_empty());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_request_config_records_nothing() {
        let backend = ScriptedBackend::replying(vec![]);
        let state = router_state(backend.clone());
        let result = analyze_code(
            State(state.clone()),
            Json(AnalyzeCodeRequest {
                config: Some(TutorConfig {
                    temperature: 3.0,
                    ..TutorConfig::default()
                }),
                ..code_request("print(1)")
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(state.0.read().await.activities().is_empty());
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_debug_records_completed_activity() {
        let state = router_state(ScriptedBackend::replying(vec![Ok(debug_reply())]));
        let response = debug_code(
            State(state.clone()),
            Json(DebugRequest {
                code: "print(1".to_string(),
                language: None,
                problem: None,
                config: None,
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(response.result.detected_language, Some(Language::Python));
        let app_state = state.0.read().await;
        let item = app_state.activities().get(&response.activity_id).unwrap();
        assert_eq!(item.kind, ActivityKind::DebugAnalysis);
        assert_eq!(item.summary, "Unclosed call");
        assert!(item.is_complete());
    }

    #[tokio::test]
    async fn test_failed_operation_leaves_pending_activity() {
        let state = router_state(ScriptedBackend::replying(vec![Err(
            AppError::ServiceUnavailable("down".into()),
        )]));
        let result = debug_code(
            State(state.clone()),
            Json(DebugRequest {
                code: "print(1".to_string(),
                language: Some("python".to_string()),
                problem: None,
                config: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
        let app_state = state.0.read().await;
        assert_eq!(app_state.activities().len(), 1);
        assert!(!app_state.activities().list()[0].is_complete());
    }

    #[tokio::test]
    async fn test_concept_with_unknown_language_is_rejected() {
        let backend = ScriptedBackend::replying(vec![]);
        let result = analyze_concept(
            State(router_state(backend.clone())),
            Json(AnalyzeConceptRequest {
                concept: "recursion".to_string(),
                language: "klingon".to_string(),
                difficulty: None,
                config: None,
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_extract_without_analysis_records_nothing() {
        let backend = ScriptedBackend::replying(vec![Ok(json!({
            "code": "console.log(1)",
            "detectedLanguage": "javascript"
        })
        .to_string())]);
        let state = router_state(backend);
        let response = extract_image(
            State(state.clone()),
            Json(ImageRequest {
                image: ImageInput {
                    mime_type: Some("image/png".to_string()),
                    data: "aGVsbG8=".to_string(),
                },
                analyze: false,
                difficulty: None,
                config: None,
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(response.extracted.language, Language::JavaScript);
        assert!(response.analysis.is_none());
        assert!(state.0.read().await.activities().is_empty());
    }
}
