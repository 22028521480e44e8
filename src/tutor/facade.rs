//! Operation facade
//!
//! `Tutor` exposes one async method per capability. Each method checks its
//! input, builds the prompt, resolves the model, dispatches under the
//! operation's time budget and, for structured operations, validates and
//! then normalises the response before returning it. Nothing is cached and
//! no state is shared between calls.

use crate::config::{ModelCatalog, TimeoutConfig};
use crate::error::AppError;
use crate::tutor::difficulty::Difficulty;
use crate::tutor::language::Language;
use crate::tutor::model_policy::{count_lines, resolve_model, ModelPreference, OperationKind};
use crate::tutor::normalize::{
    self, WireAnalysis, WireDebug, WireDependencies, WireExtractedCode, WireHints,
    WireModuleGraph, WireProjectOverview, WireSimulatedExecution,
};
use crate::tutor::prompts;
use crate::tutor::request::{
    dispatch, parse_json_payload, GenerationSettings, InlineImage, ModelBackend, ModelRequest,
    ResponseFormat,
};
use crate::tutor::types::{
    AnalysisResult, ChatMessage, DebugResult, DependencyInfo, ExampleSnippet, ExtractedCode,
    ImageInput, ModuleNode, PracticeQuestion, ProjectAnalysis, ProjectInput, SimulatedExecution,
    SolutionFeedback,
};
use crate::tutor::validate::{self, unwrap_single_object};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Most instruction levels a practice question can reach
pub const MAX_INSTRUCTION_LEVELS: usize = 5;

/// Levels requested per `get_more_instructions` call
const LEVELS_PER_REQUEST: usize = 2;

/// Per-call user configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorConfig {
    /// Model preference; an explicit choice overrides the size heuristic
    pub model_preference: ModelPreference,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling threshold
    pub top_p: f32,
    /// Custom system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            model_preference: ModelPreference::Auto,
            temperature: 0.7,
            top_p: 0.95,
            system_instruction: None,
        }
    }
}

/// One remote call, before model resolution
struct Call {
    kind: OperationKind,
    prompt: String,
    input_lines: usize,
    format: ResponseFormat,
    image: Option<InlineImage>,
    history: Vec<ChatMessage>,
}

impl Call {
    fn text(kind: OperationKind, prompt: String) -> Self {
        Self {
            kind,
            prompt,
            input_lines: 0,
            format: ResponseFormat::Text,
            image: None,
            history: Vec::new(),
        }
    }

    fn json(kind: OperationKind, prompt: String) -> Self {
        Self {
            format: ResponseFormat::Json(None),
            ..Self::text(kind, prompt)
        }
    }

    fn schema(mut self, schema: Value) -> Self {
        self.format = ResponseFormat::Json(Some(schema));
        self
    }

    fn lines(mut self, input_lines: usize) -> Self {
        self.input_lines = input_lines;
        self
    }

    fn image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    fn history(mut self, history: &[ChatMessage]) -> Self {
        self.history = history.to_vec();
        self
    }
}

/// Reject blank text input for `field`
pub fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Reject a language the tutor cannot teach
pub fn require_language(language: Language) -> Result<(), AppError> {
    if !language.is_known() {
        return Err(AppError::InvalidInput(
            "a supported language must be specified".to_string(),
        ));
    }
    Ok(())
}

/// Reject a project with no name, no files or an unnamed file
pub fn require_project(project: &ProjectInput) -> Result<(), AppError> {
    require_text(&project.name, "project name")?;
    if project.files.is_empty() {
        return Err(AppError::InvalidInput(
            "project must contain at least one file".to_string(),
        ));
    }
    if project.files.iter().any(|f| f.path.trim().is_empty()) {
        return Err(AppError::InvalidInput(
            "every project file must have a path".to_string(),
        ));
    }
    Ok(())
}

fn require_practice(question: &PracticeQuestion) -> Result<(), AppError> {
    require_text(&question.question_text, "practice question text")
}

/// Drop a ```markdown wrapper around a whole document
fn strip_markdown_wrapper(text: &str) -> String {
    let trimmed = text.trim();
    for tag in ["```markdown\n", "```md\n"] {
        if let Some(body) = trimmed
            .strip_prefix(tag)
            .and_then(|rest| rest.strip_suffix("```"))
        {
            return body.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// The operation facade
#[derive(Clone)]
pub struct Tutor {
    backend: Arc<dyn ModelBackend>,
    models: ModelCatalog,
    timeouts: TimeoutConfig,
}

impl Tutor {
    /// Create a facade over a model backend
    pub fn new(backend: Arc<dyn ModelBackend>, models: ModelCatalog, timeouts: TimeoutConfig) -> Self {
        Self {
            backend,
            models,
            timeouts,
        }
    }

    /// Configured model catalog
    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    async fn send(&self, call: Call, config: &TutorConfig) -> Result<String, AppError> {
        let choice = resolve_model(
            call.kind,
            &config.model_preference,
            call.input_lines,
            self.models.advanced_line_threshold,
        );
        let model = choice.model_id(&self.models);
        let budget = call.kind.weight().budget(&self.timeouts);

        tracing::info!(
            operation = %call.kind,
            model = %model,
            input_lines = call.input_lines,
            "Running tutor operation"
        );

        let request = ModelRequest {
            operation: call.kind,
            model,
            prompt: call.prompt,
            image: call.image,
            history: call.history,
            settings: GenerationSettings {
                temperature: config.temperature,
                top_p: config.top_p,
                system_instruction: config
                    .system_instruction
                    .clone()
                    .filter(|s| !s.trim().is_empty()),
                response_format: call.format,
            },
        };
        dispatch(self.backend.as_ref(), &request, budget).await
    }

    async fn send_json(&self, call: Call, config: &TutorConfig) -> Result<Map<String, Value>, AppError> {
        let kind = call.kind;
        let text = self.send(call, config).await?;
        let value = parse_json_payload(&text).map_err(|e| {
            tracing::error!(operation = %kind, error = %e, "Model returned unparseable JSON");
            e
        })?;
        unwrap_single_object(value)
    }

    /// Explain submitted code
    pub async fn analyze_code(
        &self,
        code: &str,
        language: Language,
        difficulty: Difficulty,
        config: &TutorConfig,
    ) -> Result<AnalysisResult, AppError> {
        require_text(code, "code")?;

        let call = Call::json(
            OperationKind::AnalyzeCode,
            prompts::analyze_code_prompt(code, language, difficulty),
        )
        .lines(count_lines(code));
        let obj = self.send_json(call, config).await?;

        validate::validate_analysis(&obj)?;
        let example = obj.get("exampleCode").and_then(Value::as_str).unwrap_or_default();
        normalize::ensure_distinct_example(example, code)?;

        let wire: WireAnalysis = normalize::decode(obj)?;
        Ok(normalize::normalize_analysis(wire, language, Some(code)))
    }

    /// Explain a concept described in prose
    pub async fn analyze_concept(
        &self,
        concept: &str,
        language: Language,
        difficulty: Difficulty,
        config: &TutorConfig,
    ) -> Result<AnalysisResult, AppError> {
        require_text(concept, "concept")?;
        require_language(language)?;

        let call = Call::json(
            OperationKind::AnalyzeConcept,
            prompts::analyze_concept_prompt(concept, language, difficulty),
        );
        let obj = self.send_json(call, config).await?;

        validate::validate_analysis(&obj)?;
        let wire: WireAnalysis = normalize::decode(obj)?;
        Ok(normalize::normalize_analysis(wire, language, None))
    }

    /// Find and fix errors in code
    pub async fn debug_code(
        &self,
        code: &str,
        language: Language,
        problem: Option<&str>,
        config: &TutorConfig,
    ) -> Result<DebugResult, AppError> {
        require_text(code, "code")?;

        let call = Call::json(
            OperationKind::DebugCode,
            prompts::debug_code_prompt(code, language, problem),
        )
        .lines(count_lines(code));
        let obj = self.send_json(call, config).await?;

        validate::validate_debug(&obj)?;
        let wire: WireDebug = normalize::decode(obj)?;
        Ok(normalize::normalize_debug(wire, language))
    }

    /// Summarise an uploaded project.
    ///
    /// Dependencies, architecture, README and chat are left unset.
    pub async fn analyze_project(
        &self,
        project: &ProjectInput,
        config: &TutorConfig,
    ) -> Result<ProjectAnalysis, AppError> {
        require_project(project)?;

        let call = Call::json(
            OperationKind::AnalyzeProject,
            prompts::project_overview_prompt(project),
        )
        .lines(project.line_count());
        let obj = self.send_json(call, config).await?;

        validate::validate_project_overview(&obj)?;
        let wire: WireProjectOverview = normalize::decode(obj)?;
        Ok(ProjectAnalysis {
            project_name: project.name.clone(),
            overview: wire.overview,
            files: wire.files,
            dependencies: None,
            architecture: None,
            readme: None,
            chat_history: None,
        })
    }

    /// Transcribe code from an image
    pub async fn extract_code_from_image(
        &self,
        image: &ImageInput,
        config: &TutorConfig,
    ) -> Result<ExtractedCode, AppError> {
        let image = InlineImage::from_input(image)?;

        let call = Call::json(OperationKind::ExtractCodeFromImage, prompts::extract_code_prompt())
            .schema(prompts::extracted_code_schema())
            .image(image);
        let obj = self.send_json(call, config).await?;

        validate::validate_extracted_code(&obj)?;
        let wire: WireExtractedCode = normalize::decode(obj)?;
        Ok(normalize::normalize_extracted_code(wire))
    }

    /// Write a README for a project
    pub async fn generate_readme(
        &self,
        project: &ProjectInput,
        config: &TutorConfig,
    ) -> Result<String, AppError> {
        require_project(project)?;

        let call = Call::text(OperationKind::GenerateReadme, prompts::readme_prompt(project))
            .lines(project.line_count());
        let text = self.send(call, config).await?;
        Ok(strip_markdown_wrapper(&text))
    }

    /// List a project's external dependencies
    pub async fn analyze_dependencies(
        &self,
        project: &ProjectInput,
        config: &TutorConfig,
    ) -> Result<Vec<DependencyInfo>, AppError> {
        require_project(project)?;

        let call = Call::json(
            OperationKind::AnalyzeDependencies,
            prompts::dependencies_prompt(project),
        )
        .schema(prompts::dependencies_schema())
        .lines(project.line_count());
        let obj = self.send_json(call, config).await?;

        validate::validate_dependencies(&obj)?;
        let wire: WireDependencies = normalize::decode(obj)?;
        Ok(wire.dependencies)
    }

    /// Build a project's module graph
    pub async fn get_project_architecture(
        &self,
        project: &ProjectInput,
        config: &TutorConfig,
    ) -> Result<Vec<ModuleNode>, AppError> {
        require_project(project)?;

        let call = Call::json(
            OperationKind::GetProjectArchitecture,
            prompts::architecture_prompt(project),
        )
        .lines(project.line_count());
        let obj = self.send_json(call, config).await?;

        validate::validate_module_graph(&obj)?;
        let wire: WireModuleGraph = normalize::decode(obj)?;
        Ok(wire.modules)
    }

    /// Answer a question about a project, replaying earlier turns
    pub async fn ask_project_followup(
        &self,
        project: &ProjectInput,
        history: &[ChatMessage],
        question: &str,
        config: &TutorConfig,
    ) -> Result<String, AppError> {
        require_project(project)?;
        require_text(question, "question")?;

        let call = Call::text(
            OperationKind::AskProjectFollowup,
            prompts::project_followup_prompt(project, question),
        )
        .lines(project.line_count())
        .history(history);
        let text = self.send(call, config).await?;
        Ok(text.trim().to_string())
    }

    /// Answer a question about code or a concept, replaying earlier turns
    pub async fn ask_followup(
        &self,
        subject: &str,
        language: Language,
        history: &[ChatMessage],
        question: &str,
        config: &TutorConfig,
    ) -> Result<String, AppError> {
        require_text(subject, "subject")?;
        require_text(question, "question")?;

        let call = Call::text(
            OperationKind::AskFollowup,
            prompts::followup_prompt(subject, language, question),
        )
        .history(history);
        let text = self.send(call, config).await?;
        Ok(text.trim().to_string())
    }

    /// Reveal further instruction levels for a practice question.
    ///
    /// Returns only the new levels.
    pub async fn get_more_instructions(
        &self,
        question: &PracticeQuestion,
        language: Language,
        difficulty: Difficulty,
        config: &TutorConfig,
    ) -> Result<Vec<String>, AppError> {
        require_practice(question)?;
        let given = question.instructions.len();
        if given >= MAX_INSTRUCTION_LEVELS {
            return Err(AppError::InvalidInput(format!(
                "all {} instruction levels have already been revealed",
                MAX_INSTRUCTION_LEVELS
            )));
        }
        let count = LEVELS_PER_REQUEST.min(MAX_INSTRUCTION_LEVELS - given);

        let call = Call::json(
            OperationKind::GetMoreInstructions,
            prompts::more_instructions_prompt(question, language, difficulty, count),
        )
        .schema(prompts::hints_schema());
        let obj = self.send_json(call, config).await?;

        validate::validate_hints(&obj)?;
        let wire: WireHints = normalize::decode(obj)?;
        let mut levels = normalize::normalize_instructions(wire.instructions);
        if levels.is_empty() {
            return Err(AppError::EmptyResponse(
                "no new instruction levels were returned".to_string(),
            ));
        }
        levels.truncate(count);
        Ok(levels)
    }

    /// Grade a learner's solution
    pub async fn check_user_solution(
        &self,
        question: &PracticeQuestion,
        user_code: &str,
        language: Language,
        config: &TutorConfig,
    ) -> Result<SolutionFeedback, AppError> {
        require_practice(question)?;
        require_text(user_code, "solution code")?;
        require_language(language)?;

        let call = Call::json(
            OperationKind::CheckUserSolution,
            prompts::check_solution_prompt(question, user_code, language),
        )
        .schema(prompts::solution_feedback_schema())
        .lines(count_lines(user_code));
        let obj = self.send_json(call, config).await?;

        validate::validate_solution_feedback(&obj)?;
        let feedback: SolutionFeedback = normalize::decode(obj)?;
        Ok(normalize::normalize_solution_feedback(feedback))
    }

    /// Generate an example at a difficulty
    pub async fn get_example_by_difficulty(
        &self,
        topic: &str,
        language: Language,
        difficulty: Difficulty,
        config: &TutorConfig,
    ) -> Result<ExampleSnippet, AppError> {
        require_text(topic, "topic")?;
        require_language(language)?;

        let call = Call::json(
            OperationKind::GetExampleByDifficulty,
            prompts::example_prompt(topic, language, difficulty),
        )
        .lines(count_lines(topic));
        let obj = self.send_json(call, config).await?;

        validate::validate_example(&obj)?;
        let example = obj.get("exampleCode").and_then(Value::as_str).unwrap_or_default();
        normalize::ensure_distinct_example(example, topic)?;

        normalize::decode(obj)
    }

    /// Generate a practice question at a difficulty
    pub async fn get_practice_question_by_difficulty(
        &self,
        topic: &str,
        language: Language,
        difficulty: Difficulty,
        config: &TutorConfig,
    ) -> Result<PracticeQuestion, AppError> {
        require_text(topic, "topic")?;
        require_language(language)?;

        let call = Call::json(
            OperationKind::GetPracticeQuestionByDifficulty,
            prompts::practice_question_prompt(topic, language, difficulty),
        )
        .lines(count_lines(topic));
        let obj = self.send_json(call, config).await?;

        validate::validate_practice_question(&obj)?;
        let question: PracticeQuestion = normalize::decode(obj)?;
        Ok(normalize::normalize_practice_question(question))
    }

    /// Simulate running code with the given stdin lines
    pub async fn execute_code_simulated(
        &self,
        code: &str,
        language: Language,
        inputs: &[String],
        config: &TutorConfig,
    ) -> Result<SimulatedExecution, AppError> {
        require_text(code, "code")?;
        require_language(language)?;

        let call = Call::json(
            OperationKind::ExecuteCodeSimulated,
            prompts::execute_simulated_prompt(code, language, inputs),
        )
        .lines(count_lines(code));
        let obj = self.send_json(call, config).await?;

        validate::validate_simulated_execution(&obj)?;
        let wire: WireSimulatedExecution = normalize::decode(obj)?;
        Ok(normalize::normalize_simulated_execution(wire))
    }
}
