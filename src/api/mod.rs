//! API module
//!
//! HTTP request handlers for the tutor operations, the activity history and
//! user settings, plus the route table tying them together.

pub mod activities;
pub mod analysis;
pub mod practice;
pub mod project;
pub mod utils;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub use utils::RouterState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Whether a model credential is configured
    pub model_configured: bool,
}

/// Build the application router
pub fn router(state: RouterState, model_configured: bool) -> Router {
    Router::new()
        .route(
            "/api/health",
            get(move || health_check(model_configured)),
        )
        // Analysis
        .route("/api/analyze/code", post(analysis::analyze_code))
        .route("/api/analyze/concept", post(analysis::analyze_concept))
        .route("/api/debug", post(analysis::debug_code))
        .route("/api/image/extract", post(analysis::extract_image))
        // Projects
        .route("/api/project/analyze", post(project::analyze_project))
        .route("/api/project/readme", post(project::generate_readme))
        .route(
            "/api/project/dependencies",
            post(project::analyze_dependencies),
        )
        .route("/api/project/architecture", post(project::get_architecture))
        .route("/api/project/ask", post(project::ask_project))
        // Practice
        .route("/api/followup", post(practice::ask_followup))
        .route(
            "/api/practice/instructions",
            post(practice::more_instructions),
        )
        .route("/api/practice/check", post(practice::check_solution))
        .route("/api/practice/question", post(practice::practice_question))
        .route("/api/example", post(practice::example))
        .route("/api/execute", post(practice::execute))
        // History and settings
        .route(
            "/api/activities",
            get(activities::list_activities).delete(activities::clear_activities),
        )
        .route("/api/activities/:id", get(activities::get_activity))
        .route(
            "/api/settings",
            get(activities::get_settings).post(activities::update_settings),
        )
        .with_state(state)
}

async fn health_check(model_configured: bool) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_configured,
    })
}
