// State management module
// Handles activity history, user settings, and persistence

pub mod activity;
pub mod app_state;
pub mod persistence;
pub mod settings;

pub use activity::{ActivityId, ActivityItem, ActivityKind, ActivityLog, ActivityResult};
pub use app_state::AppState;
pub use persistence::PersistenceError;
pub use settings::{validate_tutor_config, SettingsUpdateRequest, UserSettings};
