//! Model-resolution policy
//!
//! Picks the model that serves one operation from the operation kind, the
//! caller's preference and the size of the input. An explicit preference
//! always wins; under `auto`, code-bearing operations escalate to the
//! advanced tier once the input exceeds the configured line threshold.

use crate::config::{ModelCatalog, TimeoutConfig};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Every operation the tutor exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// Explain submitted code
    AnalyzeCode,
    /// Explain a concept described in prose
    AnalyzeConcept,
    /// Find and fix errors in code
    DebugCode,
    /// Summarise an uploaded project
    AnalyzeProject,
    /// Transcribe code from an image
    ExtractCodeFromImage,
    /// Write a README for a project
    GenerateReadme,
    /// List a project's external dependencies
    AnalyzeDependencies,
    /// Build a project's module graph
    GetProjectArchitecture,
    /// Answer a question about a project
    AskProjectFollowup,
    /// Answer a question about an analysis
    AskFollowup,
    /// Reveal further instruction levels
    GetMoreInstructions,
    /// Grade a practice solution
    CheckUserSolution,
    /// Generate an example at a difficulty
    GetExampleByDifficulty,
    /// Generate a practice question at a difficulty
    GetPracticeQuestionByDifficulty,
    /// Simulate running code
    ExecuteCodeSimulated,
}

/// Relative cost of an operation, used to pick its timeout budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationWeight {
    /// Short answers
    Light,
    /// One generated artifact
    Standard,
    /// Full analyses and whole-project work
    Heavy,
}

impl OperationWeight {
    /// Budget for this weight
    pub fn budget(&self, timeouts: &TimeoutConfig) -> Duration {
        match self {
            OperationWeight::Light => timeouts.light(),
            OperationWeight::Standard => timeouts.standard(),
            OperationWeight::Heavy => timeouts.heavy(),
        }
    }
}

/// Underlying model tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// Cheaper, lower-latency model
    Fast,
    /// More capable model
    Advanced,
}

impl OperationKind {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::AnalyzeCode => "analyze_code",
            OperationKind::AnalyzeConcept => "analyze_concept",
            OperationKind::DebugCode => "debug_code",
            OperationKind::AnalyzeProject => "analyze_project",
            OperationKind::ExtractCodeFromImage => "extract_code_from_image",
            OperationKind::GenerateReadme => "generate_readme",
            OperationKind::AnalyzeDependencies => "analyze_dependencies",
            OperationKind::GetProjectArchitecture => "get_project_architecture",
            OperationKind::AskProjectFollowup => "ask_project_followup",
            OperationKind::AskFollowup => "ask_followup",
            OperationKind::GetMoreInstructions => "get_more_instructions",
            OperationKind::CheckUserSolution => "check_user_solution",
            OperationKind::GetExampleByDifficulty => "get_example_by_difficulty",
            OperationKind::GetPracticeQuestionByDifficulty => {
                "get_practice_question_by_difficulty"
            }
            OperationKind::ExecuteCodeSimulated => "execute_code_simulated",
        }
    }

    /// Whether the input is source code subject to size escalation
    pub fn is_code_bearing(&self) -> bool {
        matches!(
            self,
            OperationKind::AnalyzeCode
                | OperationKind::DebugCode
                | OperationKind::CheckUserSolution
                | OperationKind::GetExampleByDifficulty
                | OperationKind::GetPracticeQuestionByDifficulty
                | OperationKind::ExecuteCodeSimulated
        )
    }

    /// Tier used under `auto` before size escalation
    pub fn base_tier(&self) -> ModelTier {
        match self {
            OperationKind::AnalyzeProject
            | OperationKind::GenerateReadme
            | OperationKind::GetProjectArchitecture => ModelTier::Advanced,
            _ => ModelTier::Fast,
        }
    }

    /// Cost class of the operation
    pub fn weight(&self) -> OperationWeight {
        match self {
            OperationKind::AnalyzeCode
            | OperationKind::AnalyzeConcept
            | OperationKind::AnalyzeProject
            | OperationKind::GenerateReadme
            | OperationKind::GetProjectArchitecture => OperationWeight::Heavy,
            OperationKind::DebugCode
            | OperationKind::ExtractCodeFromImage
            | OperationKind::AnalyzeDependencies
            | OperationKind::GetExampleByDifficulty
            | OperationKind::GetPracticeQuestionByDifficulty
            | OperationKind::ExecuteCodeSimulated => OperationWeight::Standard,
            OperationKind::AskProjectFollowup
            | OperationKind::AskFollowup
            | OperationKind::GetMoreInstructions
            | OperationKind::CheckUserSolution => OperationWeight::Light,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The caller's model preference
///
/// Serialised as a plain string: `"auto"`, `"fast"`, `"advanced"`, or any
/// other value naming a model explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ModelPreference {
    /// Let the policy decide
    #[default]
    Auto,
    /// Always the fast tier
    Fast,
    /// Always the advanced tier
    Advanced,
    /// A literal model identifier
    Custom(String),
}

impl ModelPreference {
    /// Parse the string form
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | "auto" => ModelPreference::Auto,
            "fast" => ModelPreference::Fast,
            "advanced" => ModelPreference::Advanced,
            other => ModelPreference::Custom(other.to_string()),
        }
    }

    /// String form
    pub fn as_str(&self) -> &str {
        match self {
            ModelPreference::Auto => "auto",
            ModelPreference::Fast => "fast",
            ModelPreference::Advanced => "advanced",
            ModelPreference::Custom(model) => model,
        }
    }
}

impl Serialize for ModelPreference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelPreference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ModelPreference::parse(&raw))
    }
}

/// Outcome of the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    /// One of the configured tiers
    Tier(ModelTier),
    /// A model named explicitly by the caller
    Explicit(String),
}

impl ModelChoice {
    /// Concrete model identifier
    pub fn model_id(&self, catalog: &ModelCatalog) -> String {
        match self {
            ModelChoice::Tier(ModelTier::Fast) => catalog.fast_model.clone(),
            ModelChoice::Tier(ModelTier::Advanced) => catalog.advanced_model.clone(),
            ModelChoice::Explicit(model) => model.clone(),
        }
    }
}

/// Resolve the model for one call.
///
/// `input_lines` is the line count of the code input (summed across files
/// for projects); it only matters for code-bearing operations under `auto`.
pub fn resolve_model(
    kind: OperationKind,
    preference: &ModelPreference,
    input_lines: usize,
    advanced_line_threshold: usize,
) -> ModelChoice {
    match preference {
        ModelPreference::Fast => ModelChoice::Tier(ModelTier::Fast),
        ModelPreference::Advanced => ModelChoice::Tier(ModelTier::Advanced),
        ModelPreference::Custom(model) => ModelChoice::Explicit(model.clone()),
        ModelPreference::Auto => {
            if kind.is_code_bearing() && input_lines > advanced_line_threshold {
                ModelChoice::Tier(ModelTier::Advanced)
            } else {
                ModelChoice::Tier(kind.base_tier())
            }
        }
    }
}

/// Number of lines in a piece of code
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}
