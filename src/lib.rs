//! Code Tutor Backend Library
//!
//! Turns learner actions (submit code, ask about a concept, upload a project,
//! request a hint) into prompts for a remote generative model, and turns the
//! model's replies into validated, typed results. The HTTP binary is in
//! `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
/// Gemini REST client implementing the model boundary
pub mod gemini;
/// Application state management
///
/// Handles activity history, user settings, and persistence.
pub mod state;
pub mod tutor;
