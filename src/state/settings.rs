//! User settings
//!
//! Persisted generation preferences. Every tutor call receives them as a
//! `TutorConfig` unless the request carries its own configuration.

use crate::error::AppError;
use crate::tutor::{Difficulty, ModelPreference, TutorConfig};
use serde::{Deserialize, Serialize};

/// Allowed temperature range
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// Allowed top-p range
pub const TOP_P_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Model preference
    pub model_preference: ModelPreference,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus-sampling threshold
    pub top_p: f32,
    /// Custom system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Difficulty used when a request does not name one
    pub default_difficulty: Difficulty,
}

impl Default for UserSettings {
    fn default() -> Self {
        let config = TutorConfig::default();
        Self {
            model_preference: config.model_preference,
            temperature: config.temperature,
            top_p: config.top_p,
            system_instruction: config.system_instruction,
            default_difficulty: Difficulty::default(),
        }
    }
}

impl UserSettings {
    /// Per-call configuration derived from these settings
    pub fn to_tutor_config(&self) -> TutorConfig {
        TutorConfig {
            model_preference: self.model_preference.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            system_instruction: self.system_instruction.clone(),
        }
    }
}

/// Request body for updating settings; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateRequest {
    /// New model preference
    pub model_preference: Option<ModelPreference>,
    /// New temperature
    pub temperature: Option<f32>,
    /// New top-p
    pub top_p: Option<f32>,
    /// New system instruction; an empty string clears it
    pub system_instruction: Option<String>,
    /// New default difficulty
    pub default_difficulty: Option<Difficulty>,
}

fn check_temperature(temperature: f32) -> Result<(), AppError> {
    if !TEMPERATURE_RANGE.contains(&temperature) {
        return Err(AppError::InvalidInput(format!(
            "temperature must be between {} and {}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        )));
    }
    Ok(())
}

fn check_top_p(top_p: f32) -> Result<(), AppError> {
    if !TOP_P_RANGE.contains(&top_p) {
        return Err(AppError::InvalidInput(format!(
            "topP must be between {} and {}",
            TOP_P_RANGE.start(),
            TOP_P_RANGE.end()
        )));
    }
    Ok(())
}

/// Check a per-call configuration against the same ranges as saved settings
pub fn validate_tutor_config(config: &TutorConfig) -> Result<(), AppError> {
    check_temperature(config.temperature)?;
    check_top_p(config.top_p)
}

/// Validate and apply settings updates
///
/// Fails with `InvalidInput` naming the first out-of-range field; the
/// settings are unchanged in that case. On success, also returns a
/// human-readable description of what changed.
pub fn validate_and_apply_settings_update(
    current: &UserSettings,
    request: SettingsUpdateRequest,
) -> Result<(UserSettings, Vec<String>), AppError> {
    let mut settings = current.clone();
    let mut changes = Vec::new();

    if let Some(temperature) = request.temperature {
        check_temperature(temperature)?;
        if temperature != settings.temperature {
            changes.push(format!("temperature {} -> {}", settings.temperature, temperature));
            settings.temperature = temperature;
        }
    }

    if let Some(top_p) = request.top_p {
        check_top_p(top_p)?;
        if top_p != settings.top_p {
            changes.push(format!("topP {} -> {}", settings.top_p, top_p));
            settings.top_p = top_p;
        }
    }

    if let Some(preference) = request.model_preference {
        if preference != settings.model_preference {
            changes.push(format!(
                "model {} -> {}",
                settings.model_preference.as_str(),
                preference.as_str()
            ));
            settings.model_preference = preference;
        }
    }

    if let Some(instruction) = request.system_instruction {
        let instruction = Some(instruction.trim().to_string()).filter(|s| !s.is_empty());
        if instruction != settings.system_instruction {
            changes.push(
                if instruction.is_some() {
                    "system instruction updated"
                } else {
                    "system instruction cleared"
                }
                .to_string(),
            );
            settings.system_instruction = instruction;
        }
    }

    if let Some(difficulty) = request.default_difficulty {
        if difficulty != settings.default_difficulty {
            changes.push(format!(
                "difficulty {} -> {}",
                settings.default_difficulty.as_str(),
                difficulty.as_str()
            ));
            settings.default_difficulty = difficulty;
        }
    }

    Ok((settings, changes))
}
