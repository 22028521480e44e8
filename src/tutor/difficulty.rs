//! Difficulty levels and the shared difficulty guidance
//!
//! Every prompt that asks the model for example or practice code embeds
//! the same guidance block, so "easy" means the same thing across features.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested difficulty for generated examples and practice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Beginner-friendly
    Easy,
    /// Some prior experience assumed
    #[default]
    Intermediate,
    /// Challenging, multi-part
    Hard,
}

/// Concrete constraints for generated code at one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyGuidance {
    /// Approximate minimum number of lines
    pub min_lines: u32,
    /// Approximate maximum number of lines
    pub max_lines: u32,
    /// Expected logic complexity
    pub logic: &'static str,
    /// Breadth of language features to use
    pub features: &'static str,
}

impl Difficulty {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Hard => "hard",
        }
    }

    /// Constraints applied to generated code at this level
    pub fn guidance(&self) -> DifficultyGuidance {
        match self {
            Difficulty::Easy => DifficultyGuidance {
                min_lines: 5,
                max_lines: 15,
                logic: "straight-line code or a single simple loop or conditional",
                features: "one core concept, basic built-ins only, no user-defined classes",
            },
            Difficulty::Intermediate => DifficultyGuidance {
                min_lines: 15,
                max_lines: 40,
                logic: "nested control flow and at least one helper function",
                features: "two or three combined concepts, standard collections, simple error handling",
            },
            Difficulty::Hard => DifficultyGuidance {
                min_lines: 40,
                max_lines: 80,
                logic: "several interacting functions or types with non-trivial algorithmic reasoning",
                features: "broad feature use, edge-case handling, error handling and data structure design",
            },
        }
    }

    /// Prompt block describing the constraints for this level
    pub fn prompt_block(&self) -> String {
        let g = self.guidance();
        format!(
            "DIFFICULTY: {}\n\
             - Length: roughly {} to {} lines of code.\n\
             - Logic: {}.\n\
             - Features: {}.\n\
             Apply these constraints to every piece of example or practice code you write.",
            self.as_str().to_uppercase(),
            g.min_lines,
            g.max_lines,
            g.logic,
            g.features
        )
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
