//! Project API
//!
//! Whole-project analysis plus the on-demand README, dependency,
//! architecture and chat operations. The on-demand results are stored on the
//! project activity when the request names one.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::utils::{
    complete_activity, log_failure, record_activity, resolve_config, ActivityResponse,
    RouterState,
};
use crate::error::AppError;
use crate::state::{ActivityId, ActivityItem, ActivityKind, ActivityResult};
use crate::tutor::{
    require_project, ChatMessage, DependencyInfo, Language, ModuleNode, ProjectAnalysis,
    ProjectInput, TutorConfig,
};

/// Request body for POST /api/project/analyze
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeProjectRequest {
    /// Project name and files
    pub project: ProjectInput,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for the on-demand project operations
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOperationRequest {
    /// Project name and files
    pub project: ProjectInput,
    /// Project activity to store the result on
    #[serde(default)]
    pub activity_id: Option<ActivityId>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for POST /api/project/ask
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuestionRequest {
    /// Project name and files
    pub project: ProjectInput,
    /// Prior turns; defaults to the activity's stored conversation
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    /// The new question
    pub question: String,
    /// Project activity holding the conversation
    #[serde(default)]
    pub activity_id: Option<ActivityId>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Response for the on-demand project operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOperationResponse<T> {
    /// Activity the result was stored on, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<ActivityId>,
    /// Operation result
    pub result: T,
}

/// Response for POST /api/project/ask
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    /// Activity the turns were appended to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<ActivityId>,
    /// Plain-text answer
    pub answer: String,
}

/// POST /api/project/analyze - Overview and per-file descriptions
pub async fn analyze_project(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<AnalyzeProjectRequest>,
) -> Result<Json<ActivityResponse<ProjectAnalysis>>, AppError> {
    require_project(&request.project)?;
    let config = resolve_config(&app_state, request.config).await?;

    let activity_id = record_activity(
        &app_state,
        ActivityItem::new(
            ActivityKind::ProjectAnalysis,
            request.project.name.clone(),
            Language::Unknown,
            None,
        ),
    )
    .await?;

    let result = tutor
        .analyze_project(&request.project, &config)
        .await
        .map_err(|e| {
            log_failure(&activity_id, "analyze_project", &e);
            e
        })?;

    complete_activity(&app_state, &activity_id, ActivityResult::Project(result.clone())).await?;
    Ok(Json(ActivityResponse {
        activity_id,
        result,
    }))
}

/// POST /api/project/readme - Generate a README
pub async fn generate_readme(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<ProjectOperationRequest>,
) -> Result<Json<ProjectOperationResponse<String>>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let readme = tutor.generate_readme(&request.project, &config).await?;

    if let Some(id) = &request.activity_id {
        let stored = readme.clone();
        app_state
            .write()
            .await
            .update_project(id, move |project| project.readme = Some(stored))?;
    }

    Ok(Json(ProjectOperationResponse {
        activity_id: request.activity_id,
        result: readme,
    }))
}

/// POST /api/project/dependencies - Describe external dependencies
pub async fn analyze_dependencies(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<ProjectOperationRequest>,
) -> Result<Json<ProjectOperationResponse<Vec<DependencyInfo>>>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let dependencies = tutor.analyze_dependencies(&request.project, &config).await?;

    if let Some(id) = &request.activity_id {
        let stored = dependencies.clone();
        app_state
            .write()
            .await
            .update_project(id, move |project| project.dependencies = Some(stored))?;
    }

    Ok(Json(ProjectOperationResponse {
        activity_id: request.activity_id,
        result: dependencies,
    }))
}

/// POST /api/project/architecture - Internal module graph
pub async fn get_architecture(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<ProjectOperationRequest>,
) -> Result<Json<ProjectOperationResponse<Vec<ModuleNode>>>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let modules = tutor
        .get_project_architecture(&request.project, &config)
        .await?;

    if let Some(id) = &request.activity_id {
        let stored = modules.clone();
        app_state
            .write()
            .await
            .update_project(id, move |project| project.architecture = Some(stored))?;
    }

    Ok(Json(ProjectOperationResponse {
        activity_id: request.activity_id,
        result: modules,
    }))
}

/// POST /api/project/ask - Answer a question about the project
pub async fn ask_project(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<ProjectQuestionRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;

    let history = match (request.history, &request.activity_id) {
        (Some(history), _) => history,
        (None, Some(id)) => {
            let state = app_state.read().await;
            state
                .activities()
                .get(id)
                .ok_or_else(|| AppError::ActivityNotFound(id.clone()))?
                .chat()
                .to_vec()
        }
        (None, None) => Vec::new(),
    };

    let answer = tutor
        .ask_project_followup(&request.project, &history, &request.question, &config)
        .await?;

    if let Some(id) = &request.activity_id {
        app_state.write().await.append_chat(
            id,
            vec![
                ChatMessage::user(request.question.clone()),
                ChatMessage::model(answer.clone()),
            ],
        )?;
    }

    Ok(Json(AnswerResponse {
        activity_id: request.activity_id,
        answer,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::tutor::testing::{scripted_tutor, ScriptedBackend};
    use crate::tutor::{ChatRole, ProjectFile};
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn project() -> ProjectInput {
        ProjectInput {
            name: "demo".to_string(),
            files: vec![ProjectFile {
                path: "main.py".to_string(),
                content: "print('hi')\n".to_string(),
            }],
        }
    }

    fn overview_reply() -> String {
        json!({
            "projectName": "demo",
            "overview": "A greeting script.",
            "files": [{"path": "main.py", "description": "Prints a greeting"}]
        })
        .to_string()
    }

    async fn analyzed(backend: Arc<ScriptedBackend>) -> (RouterState, ActivityId) {
        let state: RouterState = (Arc::new(RwLock::new(AppState::new())), scripted_tutor(backend));
        let response = analyze_project(
            State(state.clone()),
            Json(AnalyzeProjectRequest {
                project: project(),
                config: None,
            }),
        )
        .await
        .unwrap()
        .0;
        (state, response.activity_id)
    }

    #[tokio::test]
    async fn test_readme_is_stored_on_activity() {
        let backend = ScriptedBackend::replying(vec![
            Ok(overview_reply()),
            Ok("```markdown\n# demo\n```".to_string()),
        ]);
        let (state, id) = analyzed(backend).await;

        let response = generate_readme(
            State(state.clone()),
            Json(ProjectOperationRequest {
                project: project(),
                activity_id: Some(id.clone()),
                config: None,
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(response.result, "# demo");
        let app_state = state.0.read().await;
        match &app_state.activities().get(&id).unwrap().result {
            Some(ActivityResult::Project(project)) => {
                assert_eq!(project.readme.as_deref(), Some("# demo"));
                assert!(project.dependencies.is_none());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ask_appends_turns_and_replays_them() {
        let backend = ScriptedBackend::replying(vec![
            Ok(overview_reply()),
            Ok("It prints hi.".to_string()),
            Ok("Once.".to_string()),
        ]);
        let (state, id) = analyzed(backend.clone()).await;

        for question in ["What does it do?", "How often?"] {
            ask_project(
                State(state.clone()),
                Json(ProjectQuestionRequest {
                    project: project(),
                    history: None,
                    question: question.to_string(),
                    activity_id: Some(id.clone()),
                    config: None,
                }),
            )
            .await
            .unwrap();
        }

        let app_state = state.0.read().await;
        let chat = app_state.activities().get(&id).unwrap().chat().to_vec();
        assert_eq!(chat.len(), 4);
        assert_eq!(chat[0].role, ChatRole::User);
        assert_eq!(chat[3].text, "Once.");

        // The second question carried the first exchange as history
        let requests = backend.requests();
        assert_eq!(requests[2].history.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_activity_is_reported() {
        let backend = ScriptedBackend::replying(vec![Ok("[]".to_string())]);
        let state: RouterState = (Arc::new(RwLock::new(AppState::new())), scripted_tutor(backend));

        let result = ask_project(
            State(state),
            Json(ProjectQuestionRequest {
                project: project(),
                history: None,
                question: "Why?".to_string(),
                activity_id: Some("missing".to_string()),
                config: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::ActivityNotFound(_))));
    }
}
