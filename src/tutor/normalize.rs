//! Response normalizers
//!
//! Turn validated model output into the typed results in `types`. This is
//! where known mismatches between what the model is asked for and what
//! callers need get repaired: JSON-string variable snapshots are decoded,
//! free-text languages are mapped onto `Language`, and fields the caller
//! already knows are pinned to the caller's values.

use crate::error::AppError;
use crate::tutor::language::Language;
use crate::tutor::types::{
    AnalysisResult, DebugResult, DependencyInfo, ErrorFinding, ExtractedCode,
    FileDescription, ModuleNode, ParsingErrorMarker, PendingInput, PracticeContext,
    PracticeQuestion, SimulatedExecution, SolutionFeedback, TopicExplanation, VariableState,
    VisualExecutionStep,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Decode an already-validated object into its wire struct
pub fn decode<T: DeserializeOwned>(obj: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(obj))
        .map_err(|e| AppError::SchemaValidationFailed(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStep {
    #[serde(default)]
    line_number: Option<u32>,
    explanation: String,
    variables_state: Value,
    #[serde(default)]
    console_output: Option<String>,
    #[serde(default)]
    pending_input: Option<PendingInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTopic {
    core_concepts: String,
    block_by_block_breakdown: String,
    line_by_line_breakdown: String,
    execution_flow: String,
    visual_execution_trace: Vec<WireStep>,
}

/// Analysis bundle as produced by the model
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnalysis {
    topic_explanation: WireTopic,
    example_code: String,
    example_code_output: String,
    practice_context: PracticeContext,
    #[serde(default)]
    detected_language: Option<String>,
}

/// Debug bundle as produced by the model
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDebug {
    summary: String,
    errors: Vec<ErrorFinding>,
    corrected_code: String,
    #[serde(default)]
    detected_language: Option<String>,
}

/// Project overview bundle
#[derive(Debug, Deserialize)]
pub struct WireProjectOverview {
    /// Overview narrative
    pub overview: String,
    /// Per-file descriptions
    pub files: Vec<FileDescription>,
}

/// Dependency-list bundle
#[derive(Debug, Deserialize)]
pub struct WireDependencies {
    /// Dependencies
    pub dependencies: Vec<DependencyInfo>,
}

/// Module-graph bundle
#[derive(Debug, Deserialize)]
pub struct WireModuleGraph {
    /// Modules
    pub modules: Vec<ModuleNode>,
}

/// Multi-level-hint bundle
#[derive(Debug, Deserialize)]
pub struct WireHints {
    /// New instruction levels
    pub instructions: Vec<String>,
}

/// Image-extraction bundle
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireExtractedCode {
    code: String,
    detected_language: String,
}

/// Simulated-execution bundle
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSimulatedExecution {
    steps: Vec<WireStep>,
    final_output: String,
}

/// Decode a variable snapshot.
///
/// Strings are parsed as JSON objects; objects pass through. Anything that
/// does not yield an object becomes the parsing-error sentinel.
pub fn normalize_variable_state(raw: &Value) -> VariableState {
    let sentinel = |raw: String, message: String| {
        tracing::warn!(raw = %raw, error = %message, "Unparseable variable snapshot");
        VariableState::ParsingError(ParsingErrorMarker {
            parsing_error: true,
            raw,
            message,
        })
    };

    match raw {
        Value::Object(map) => VariableState::Values(map.clone()),
        Value::String(s) if s.trim().is_empty() => VariableState::Values(Map::new()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => VariableState::Values(map),
            Ok(other) => sentinel(
                s.clone(),
                format!("expected a JSON object, found {}", json_kind(&other)),
            ),
            Err(e) => sentinel(s.clone(), e.to_string()),
        },
        other => sentinel(
            other.to_string(),
            format!("expected a JSON-encoded object, found {}", json_kind(other)),
        ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn normalize_step(step: WireStep) -> VisualExecutionStep {
    VisualExecutionStep {
        line_number: step.line_number,
        explanation: step.explanation,
        variables_state: normalize_variable_state(&step.variables_state),
        console_output: step.console_output.filter(|s| !s.is_empty()),
        pending_input: step.pending_input,
    }
}

/// Pick the requested language when known, else the detected one
pub fn resolve_language(requested: Language, detected: Option<&str>) -> Language {
    if requested.is_known() {
        requested
    } else {
        detected.map(Language::normalize).unwrap_or(Language::Unknown)
    }
}

/// Build an `AnalysisResult`.
///
/// When `submitted_code` is given, `userCodeAsPractice.solutionCode` is
/// pinned to it verbatim.
pub fn normalize_analysis(
    wire: WireAnalysis,
    requested: Language,
    submitted_code: Option<&str>,
) -> AnalysisResult {
    let mut practice_context = wire.practice_context;
    if let Some(code) = submitted_code {
        practice_context.user_code_as_practice.solution_code = code.to_string();
    }

    AnalysisResult {
        language: resolve_language(requested, wire.detected_language.as_deref()),
        topic_explanation: TopicExplanation {
            core_concepts: wire.topic_explanation.core_concepts,
            block_by_block_breakdown: wire.topic_explanation.block_by_block_breakdown,
            line_by_line_breakdown: wire.topic_explanation.line_by_line_breakdown,
            execution_flow: wire.topic_explanation.execution_flow,
            visual_execution_trace: wire
                .topic_explanation
                .visual_execution_trace
                .into_iter()
                .map(normalize_step)
                .collect(),
        },
        example_code: wire.example_code,
        example_code_output: wire.example_code_output,
        practice_context,
    }
}

/// Build a `DebugResult`; the detected language is kept only when none was given
pub fn normalize_debug(wire: WireDebug, requested: Language) -> DebugResult {
    let detected_language = if requested.is_known() {
        None
    } else {
        Some(resolve_language(requested, wire.detected_language.as_deref()))
    };
    DebugResult {
        summary: wire.summary,
        errors: wire.errors,
        corrected_code: wire.corrected_code,
        detected_language,
    }
}

/// Build an `ExtractedCode`
pub fn normalize_extracted_code(wire: WireExtractedCode) -> ExtractedCode {
    ExtractedCode {
        code: wire.code,
        language: Language::normalize(&wire.detected_language),
    }
}

/// Build a `SimulatedExecution`
pub fn normalize_simulated_execution(wire: WireSimulatedExecution) -> SimulatedExecution {
    SimulatedExecution {
        steps: wire.steps.into_iter().map(normalize_step).collect(),
        final_output: wire.final_output,
    }
}

/// Trim instruction levels and drop blank ones
pub fn normalize_instructions(levels: Vec<String>) -> Vec<String> {
    levels
        .into_iter()
        .map(|level| level.trim().to_string())
        .filter(|level| !level.is_empty())
        .collect()
}

/// Tidy a practice question
pub fn normalize_practice_question(mut question: PracticeQuestion) -> PracticeQuestion {
    question.instructions = normalize_instructions(question.instructions);
    question
}

/// Tidy grading feedback
pub fn normalize_solution_feedback(mut feedback: SolutionFeedback) -> SolutionFeedback {
    feedback.suggestions.retain(|s| !s.trim().is_empty());
    feedback
}

/// Whether two pieces of code are the same text, ignoring surrounding whitespace
pub fn same_code(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

/// Reject an example that merely echoes the submission
pub fn ensure_distinct_example(example: &str, submitted: &str) -> Result<(), AppError> {
    if same_code(example, submitted) {
        return Err(AppError::SchemaValidationFailed(
            "field 'exampleCode' must differ from the submitted code".to_string(),
        ));
    }
    Ok(())
}
