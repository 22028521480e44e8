//! Typed results produced by tutor operations
//!
//! These are the values handed to callers after validation and
//! normalisation. Serialised field names are camelCase to match what the
//! browser client renders.

use crate::tutor::language::Language;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message from the learner
    User,
    /// Message from the model
    Model,
}

/// One turn of a follow-up conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message
    pub role: ChatRole,
    /// Message text
    pub text: String,
}

impl ChatMessage {
    /// Message authored by the learner
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    /// Message authored by the model
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// One source file of an uploaded project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Path relative to the project root
    pub path: String,
    /// File content
    pub content: String,
}

/// An uploaded project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInput {
    /// Project name
    pub name: String,
    /// Source files
    pub files: Vec<ProjectFile>,
}

impl ProjectInput {
    /// Total number of lines across all files
    pub fn line_count(&self) -> usize {
        self.files.iter().map(|f| f.content.lines().count()).sum()
    }
}

/// An image submitted for code extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// MIME type; may be omitted when `data` is a data URL
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Base64 payload or a `data:<mime>;base64,<payload>` URL
    pub data: String,
}

/// Snapshot of variable values at one execution step
///
/// The model sends snapshots as JSON-encoded strings; a string that does
/// not decode to an object becomes `ParsingError` rather than being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableState {
    /// Snapshot that could not be decoded
    ParsingError(ParsingErrorMarker),
    /// Decoded variable name → value mapping
    Values(Map<String, Value>),
}

/// Sentinel carried in place of an undecodable snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParsingErrorMarker {
    /// Always `true`
    pub parsing_error: bool,
    /// The text the model sent
    pub raw: String,
    /// Why decoding failed
    pub message: String,
}

impl VariableState {
    /// Whether this snapshot is the parsing-error sentinel
    pub fn is_parsing_error(&self) -> bool {
        matches!(self, VariableState::ParsingError(_))
    }
}

/// Input the simulated program is waiting for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInput {
    /// Prompt shown to the user
    pub prompt: String,
    /// Variable receiving the input, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
}

/// One simulated debugger step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualExecutionStep {
    /// 1-based source line, when the step maps to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// What happens at this step
    pub explanation: String,
    /// Variable values after the step
    pub variables_state: VariableState,
    /// Console output produced by the step, trailing newline included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_output: Option<String>,
    /// Input the program is blocked on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_input: Option<PendingInput>,
}

/// Explanation of the submitted code or concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicExplanation {
    /// Core concepts, markdown
    pub core_concepts: String,
    /// Breakdown by logical block, markdown
    pub block_by_block_breakdown: String,
    /// Breakdown by line, markdown
    pub line_by_line_breakdown: String,
    /// Execution flow and data transformation narrative
    pub execution_flow: String,
    /// Ordered step trace
    pub visual_execution_trace: Vec<VisualExecutionStep>,
}

/// A practice problem with progressive instructions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    /// Problem statement
    pub question_text: String,
    /// Instruction levels, general to specific
    pub instructions: Vec<String>,
    /// Reference solution
    pub solution_code: String,
    /// Output of the reference solution
    pub solution_output: String,
}

/// The two practice problems attached to an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeContext {
    /// A freshly generated problem
    pub generated_practice: PracticeQuestion,
    /// A problem whose solution is the learner's own submission
    pub user_code_as_practice: PracticeQuestion,
}

/// Result of analysing code or a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Language of the submission (requested or detected)
    pub language: Language,
    /// Explanation of the topic
    pub topic_explanation: TopicExplanation,
    /// Alternate example, distinct from the submission
    pub example_code: String,
    /// Expected output of `example_code`
    pub example_code_output: String,
    /// Practice problems
    pub practice_context: PracticeContext,
}

/// One error found while debugging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFinding {
    /// 1-based line of the error, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Offending line or snippet
    pub error_line: String,
    /// Error category (syntax, runtime, logic, ...)
    pub error_type: String,
    /// Why it is wrong
    pub explanation: String,
    /// How to fix it
    pub suggested_fix: String,
}

/// Result of debugging a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResult {
    /// Overall summary
    pub summary: String,
    /// Findings in source order
    pub errors: Vec<ErrorFinding>,
    /// Full corrected program
    pub corrected_code: String,
    /// Language detected when none was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<Language>,
}

/// Description of one project file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescription {
    /// File path
    pub path: String,
    /// What the file does
    pub description: String,
}

/// One external dependency of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Package name
    pub name: String,
    /// What the project uses it for
    pub description: String,
}

/// One node of the module-dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    /// File path of the module
    pub path: String,
    /// Role of the module
    pub description: String,
    /// Paths this module imports
    pub imports: Vec<String>,
    /// Paths importing this module
    pub imported_by: Vec<String>,
}

/// Whole-project analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalysis {
    /// Project name
    pub project_name: String,
    /// Overview narrative
    pub overview: String,
    /// Per-file descriptions
    pub files: Vec<FileDescription>,
    /// External dependencies, once analysed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<DependencyInfo>>,
    /// Module graph, once analysed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Vec<ModuleNode>>,
    /// Generated README, once requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    /// Follow-up conversation about the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<Vec<ChatMessage>>,
}

/// Grading of a learner's practice solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionFeedback {
    /// Whether the solution solves the problem
    pub is_correct: bool,
    /// Explanation of the verdict
    pub feedback: String,
    /// Optional improvement suggestions
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Example code at a requested difficulty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleSnippet {
    /// Example program
    pub example_code: String,
    /// Its expected output
    pub example_code_output: String,
}

/// Code transcribed from an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCode {
    /// Transcribed source
    pub code: String,
    /// Detected language
    pub language: Language,
}

/// Simulated run of a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedExecution {
    /// Step trace
    pub steps: Vec<VisualExecutionStep>,
    /// Full console output
    pub final_output: String,
}
