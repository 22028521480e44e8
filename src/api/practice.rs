//! Practice API
//!
//! Follow-up chat, progressive hints, solution grading, example and
//! practice generation, and simulated execution.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::project::AnswerResponse;
use crate::api::utils::{parse_language, resolve_config, resolve_difficulty, RouterState};
use crate::error::AppError;
use crate::state::ActivityId;
use crate::tutor::{
    ChatMessage, Difficulty, ExampleSnippet, PracticeQuestion, SimulatedExecution,
    SolutionFeedback, TutorConfig,
};

/// Request body for POST /api/followup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupRequest {
    /// Code or concept the conversation is about
    pub subject: String,
    /// Language of the subject
    #[serde(default)]
    pub language: Option<String>,
    /// Prior turns; defaults to the activity's stored conversation
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
    /// The new question
    pub question: String,
    /// Activity holding the conversation
    #[serde(default)]
    pub activity_id: Option<ActivityId>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for POST /api/practice/instructions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionsRequest {
    /// Practice question with the levels revealed so far
    pub question: PracticeQuestion,
    /// Language of the question
    #[serde(default)]
    pub language: Option<String>,
    /// Difficulty of the question
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Response for POST /api/practice/instructions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionsResponse {
    /// Newly revealed levels only
    pub instructions: Vec<String>,
}

/// Request body for POST /api/practice/check
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSolutionRequest {
    /// Practice question being answered
    pub question: PracticeQuestion,
    /// Learner's attempt
    pub user_code: String,
    /// Language of the attempt
    pub language: String,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for the topic-driven generators
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequest {
    /// Topic or code to base the artifact on
    pub topic: String,
    /// Language to generate in
    pub language: String,
    /// Target difficulty
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// Request body for POST /api/execute
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Code to trace
    pub code: String,
    /// Language of the code
    pub language: String,
    /// Stdin lines, consumed in order
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Per-call configuration
    #[serde(default)]
    pub config: Option<TutorConfig>,
}

/// POST /api/followup - Answer a follow-up question about code or a concept
pub async fn ask_followup(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<FollowupRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let language = parse_language(request.language.as_deref());

    let history = match (request.history, &request.activity_id) {
        (Some(history), _) => history,
        (None, Some(id)) => app_state
            .read()
            .await
            .activities()
            .get(id)
            .ok_or_else(|| AppError::ActivityNotFound(id.clone()))?
            .chat()
            .to_vec(),
        (None, None) => Vec::new(),
    };

    let answer = tutor
        .ask_followup(&request.subject, language, &history, &request.question, &config)
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

/// POST /api/practice/instructions - Reveal the next hint levels
pub async fn more_instructions(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<InstructionsRequest>,
) -> Result<Json<InstructionsResponse>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let difficulty = resolve_difficulty(&app_state, request.difficulty).await;
    let language = parse_language(request.language.as_deref());

    let instructions = tutor
        .get_more_instructions(&request.question, language, difficulty, &config)
        .await?;
    Ok(Json(InstructionsResponse { instructions }))
}

/// POST /api/practice/check - Grade a learner's solution
pub async fn check_solution(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<CheckSolutionRequest>,
) -> Result<Json<SolutionFeedback>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let language = parse_language(Some(&request.language));

    let feedback = tutor
        .check_user_solution(&request.question, &request.user_code, language, &config)
        .await?;
    Ok(Json(feedback))
}

/// POST /api/practice/question - Generate a practice question
pub async fn practice_question(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<PracticeQuestion>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let difficulty = resolve_difficulty(&app_state, request.difficulty).await;
    let language = parse_language(Some(&request.language));

    let question = tutor
        .get_practice_question_by_difficulty(&request.topic, language, difficulty, &config)
        .await?;
    Ok(Json(question))
}

/// POST /api/example - Generate an example snippet
pub async fn example(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<TopicRequest>,
) -> Result<Json<ExampleSnippet>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let difficulty = resolve_difficulty(&app_state, request.difficulty).await;
    let language = parse_language(Some(&request.language));

    let snippet = tutor
        .get_example_by_difficulty(&request.topic, language, difficulty, &config)
        .await?;
    Ok(Json(snippet))
}

/// POST /api/execute - Trace code without running it
pub async fn execute(
    State((app_state, tutor)): State<RouterState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<SimulatedExecution>, AppError> {
    let config = resolve_config(&app_state, request.config).await?;
    let language = parse_language(Some(&request.language));

    let execution = tutor
        .execute_code_simulated(&request.code, language, &request.inputs, &config)
        .await?;
    Ok(Json(execution))
}
