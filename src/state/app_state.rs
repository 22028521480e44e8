// Application state management
// Activity history and user settings, optionally mirrored to disk

use super::activity::{ActivityId, ActivityItem, ActivityLog, ActivityResult};
use super::persistence::{ActivityStore, PersistenceError, SettingsStore};
use super::settings::{validate_and_apply_settings_update, SettingsUpdateRequest, UserSettings};
use crate::config::PersistenceConfig;
use crate::error::AppError;
use crate::tutor::{ChatMessage, ProjectAnalysis};

/// Main application state
///
/// Every mutation is written through to the stores when persistence is
/// enabled. Callers hold the lock only around these calls, never across a
/// remote model call.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    activities: ActivityLog,
    settings: UserSettings,
    activity_store: Option<ActivityStore>,
    settings_store: Option<SettingsStore>,
}

impl AppState {
    /// In-memory state with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load state from the data directory and keep it in sync from now on
    pub fn load(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let activity_store = ActivityStore::new(config.activities_path());
        let settings_store = SettingsStore::new(config.settings_path());
        let activities = activity_store.load()?;
        let settings = settings_store.load()?;

        tracing::info!(
            activities = activities.len(),
            data_dir = %config.data_dir.display(),
            "Loaded persisted state"
        );

        Ok(Self {
            activities,
            settings,
            activity_store: Some(activity_store),
            settings_store: Some(settings_store),
        })
    }

    fn persist_activities(&self) -> Result<(), AppError> {
        if let Some(store) = &self.activity_store {
            store.save(&self.activities)?;
        }
        Ok(())
    }

    /// Activity history, newest first
    pub fn activities(&self) -> &ActivityLog {
        &self.activities
    }

    /// Current user settings
    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Record a new activity and return its id
    pub fn record_activity(&mut self, item: ActivityItem) -> Result<ActivityId, AppError> {
        let id = item.id.clone();
        tracing::debug!(activity_id = %id, kind = ?item.kind, "Recording activity");
        self.activities.insert(item);
        self.persist_activities()?;
        Ok(id)
    }

    /// Attach a result to an activity
    pub fn complete_activity(
        &mut self,
        id: &str,
        result: ActivityResult,
    ) -> Result<ActivityItem, AppError> {
        let item = self.activities.update_result(id, result)?.clone();
        self.persist_activities()?;
        Ok(item)
    }

    /// Modify the project result of a project activity
    pub fn update_project<F>(&mut self, id: &str, update: F) -> Result<ActivityItem, AppError>
    where
        F: FnOnce(&mut ProjectAnalysis),
    {
        let item = self.activities.update_project(id, update)?.clone();
        self.persist_activities()?;
        Ok(item)
    }

    /// Append follow-up turns to an activity
    pub fn append_chat(
        &mut self,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ActivityItem, AppError> {
        let item = self.activities.append_chat(id, messages)?.clone();
        self.persist_activities()?;
        Ok(item)
    }

    /// Remove every activity
    pub fn clear_activities(&mut self) -> Result<(), AppError> {
        let count = self.activities.len();
        self.activities.clear();
        self.persist_activities()?;
        tracing::info!(count = count, "Cleared activity history");
        Ok(())
    }

    /// Validate and apply a settings update.
    ///
    /// A change is recorded as a settings-update activity.
    pub fn update_settings(
        &mut self,
        request: SettingsUpdateRequest,
    ) -> Result<UserSettings, AppError> {
        let (settings, changes) = validate_and_apply_settings_update(&self.settings, request)?;
        if changes.is_empty() {
            return Ok(settings);
        }

        if let Some(store) = &self.settings_store {
            store.save(&settings)?;
        }
        self.settings = settings.clone();
        self.record_activity(ActivityItem::settings_update(changes.join(", ")))?;

        tracing::info!(changes = ?changes, "Settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::activity::ActivityKind;
    use crate::tutor::{DebugResult, Language};
    use tempfile::TempDir;

    fn debug_result() -> ActivityResult {
        ActivityResult::Debug(DebugResult {
            summary: "One error".to_string(),
            errors: vec![],
            corrected_code: "print(1)".to_string(),
            detected_language: None,
        })
    }

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.activities().is_empty());
        assert_eq!(state.settings(), &UserSettings::default());
    }

    #[test]
    fn test_record_and_complete_activity() {
        let mut state = AppState::new();
        let id = state
            .record_activity(ActivityItem::new(
                ActivityKind::DebugAnalysis,
                "print(1",
                Language::Python,
                None,
            ))
            .unwrap();

        let item = state.complete_activity(&id, debug_result()).unwrap();
        assert!(item.is_complete());
        assert_eq!(item.summary, "One error");
    }

    #[test]
    fn test_settings_update_records_activity() {
        let mut state = AppState::new();
        let settings = state
            .update_settings(SettingsUpdateRequest {
                temperature: Some(0.1),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(settings.temperature, 0.1);
        assert_eq!(state.activities().len(), 1);
        assert_eq!(state.activities().list()[0].kind, ActivityKind::SettingsUpdate);

        // No-op update records nothing
        state
            .update_settings(SettingsUpdateRequest {
                temperature: Some(0.1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(state.activities().len(), 1);
    }

    #[test]
    fn test_invalid_settings_leave_state_unchanged() {
        let mut state = AppState::new();
        let result = state.update_settings(SettingsUpdateRequest {
            top_p: Some(1.5),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(state.settings(), &UserSettings::default());
        assert!(state.activities().is_empty());
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = TempDir::new().unwrap();
        let config = PersistenceConfig {
            data_dir: dir.path().to_path_buf(),
        };

        let mut state = AppState::load(&config).unwrap();
        let id = state
            .record_activity(ActivityItem::new(
                ActivityKind::ConceptAnalysis,
                "closures",
                Language::JavaScript,
                None,
            ))
            .unwrap();
        state
            .update_settings(SettingsUpdateRequest {
                model_preference: Some(crate::tutor::ModelPreference::Fast),
                ..Default::default()
            })
            .unwrap();

        let reloaded = AppState::load(&config).unwrap();
        assert_eq!(reloaded.activities().len(), 2);
        assert!(reloaded.activities().get(&id).is_some());
        assert_eq!(
            reloaded.settings().model_preference,
            crate::tutor::ModelPreference::Fast
        );

        let mut reloaded = reloaded;
        reloaded.clear_activities().unwrap();
        assert!(AppState::load(&config).unwrap().activities().is_empty());
    }
}
