//! Tutor contract layer
//!
//! Everything between a user action and the remote model: prompt builders,
//! the timeout-bounded request wrapper, response validators and normalizers,
//! the model-resolution policy and the `Tutor` facade composing them.

pub mod difficulty;
pub mod facade;
pub mod language;
pub mod model_policy;
pub mod normalize;
pub mod prompts;
pub mod request;
#[cfg(test)]
pub mod testing;
pub mod types;
pub mod validate;

pub use difficulty::Difficulty;
pub use facade::{
    require_language, require_project, require_text, Tutor, TutorConfig, MAX_INSTRUCTION_LEVELS,
};
pub use language::Language;
pub use model_policy::{resolve_model, ModelChoice, ModelPreference, ModelTier, OperationKind};
pub use request::{ModelBackend, ModelRequest};
pub use types::*;
