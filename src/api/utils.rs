//! API utility functions
//!
//! Shared state type and helpers used by handlers to resolve per-call
//! configuration and to record activity outcomes. The state lock is only
//! taken inside these helpers, never across a model call.

use crate::error::AppError;
use crate::state::{validate_tutor_config, ActivityId, ActivityItem, ActivityResult, AppState};
use crate::tutor::{Difficulty, Language, Tutor, TutorConfig};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by every handler
pub type RouterState = (Arc<RwLock<AppState>>, Tutor);

/// Response for operations that create or update an activity
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse<T> {
    /// Activity the result was recorded on
    pub activity_id: ActivityId,
    /// Operation result
    pub result: T,
}

/// Map an optional language name onto `Language`
pub fn parse_language(raw: Option<&str>) -> Language {
    raw.map(Language::normalize).unwrap_or(Language::Unknown)
}

/// Configuration for one call: the request's own, else the saved settings.
///
/// A request's own configuration must satisfy the saved-settings ranges.
pub async fn resolve_config(
    state: &Arc<RwLock<AppState>>,
    requested: Option<TutorConfig>,
) -> Result<TutorConfig, AppError> {
    match requested {
        Some(config) => {
            validate_tutor_config(&config)?;
            Ok(config)
        }
        None => Ok(state.read().await.settings().to_tutor_config()),
    }
}

/// Difficulty for one call: the request's own, else the saved default
pub async fn resolve_difficulty(
    state: &Arc<RwLock<AppState>>,
    requested: Option<Difficulty>,
) -> Difficulty {
    match requested {
        Some(difficulty) => difficulty,
        None => state.read().await.settings().default_difficulty,
    }
}

/// Record a pending activity
pub async fn record_activity(
    state: &Arc<RwLock<AppState>>,
    item: ActivityItem,
) -> Result<ActivityId, AppError> {
    state.write().await.record_activity(item)
}

/// Attach a result to an activity
pub async fn complete_activity(
    state: &Arc<RwLock<AppState>>,
    activity_id: &str,
    result: ActivityResult,
) -> Result<(), AppError> {
    state
        .write()
        .await
        .complete_activity(activity_id, result)
        .map(|_| ())
}

/// Log a failed operation; the activity keeps no result
pub fn log_failure(activity_id: &str, operation: &str, error: &AppError) {
    tracing::error!(
        activity_id = %activity_id,
        operation = operation,
        kind = error.kind(),
        error = %error,
        "Tutor operation failed"
    );
}
