//! Activity history and settings API handlers

use crate::api::utils::RouterState;
use crate::error::AppError;
use crate::state::{ActivityId, ActivityItem, SettingsUpdateRequest, UserSettings};
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;

/// Activities list response
#[derive(Debug, Serialize)]
pub struct ActivitiesListResponse {
    /// Activities, newest first
    pub activities: Vec<ActivityItem>,
    /// Number of activities
    pub count: usize,
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator
    pub status: String,
}

/// GET /api/activities - List the activity history
pub async fn list_activities(
    State((app_state, _)): State<RouterState>,
) -> Result<Json<ActivitiesListResponse>, AppError> {
    let state = app_state.read().await;
    let activities = state.activities().list().to_vec();

    Ok(Json(ActivitiesListResponse {
        count: activities.len(),
        activities,
    }))
}

/// GET /api/activities/:id - Get one activity
pub async fn get_activity(
    State((app_state, _)): State<RouterState>,
    Path(id): Path<ActivityId>,
) -> Result<Json<ActivityItem>, AppError> {
    let state = app_state.read().await;
    let item = state
        .activities()
        .get(&id)
        .ok_or_else(|| AppError::ActivityNotFound(id.clone()))?;

    Ok(Json(item.clone()))
}

/// DELETE /api/activities - Clear the activity history
pub async fn clear_activities(
    State((app_state, _)): State<RouterState>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.write().await.clear_activities()?;

    Ok(Json(MessageResponse {
        message: "Activity history cleared".to_string(),
        status: "ok".to_string(),
    }))
}

/// GET /api/settings - Current user settings
pub async fn get_settings(
    State((app_state, _)): State<RouterState>,
) -> Result<Json<UserSettings>, AppError> {
    Ok(Json(app_state.read().await.settings().clone()))
}

/// POST /api/settings - Update user settings
pub async fn update_settings(
    State((app_state, _)): State<RouterState>,
    Json(request): Json<SettingsUpdateRequest>,
) -> Result<Json<UserSettings>, AppError> {
    let settings = app_state.write().await.update_settings(request)?;
    Ok(Json(settings))
}
