//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. Per-user generation settings are not part of this
//! configuration; they travel with each call as a `TutorConfig`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Gemini API base URL
pub const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Code-bearing inputs longer than this many lines are escalated to the advanced model
pub const DEFAULT_ADVANCED_LINE_THRESHOLD: usize = 50;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Gemini API configuration
    pub gemini: GeminiConfig,
    /// Model catalogue used by the model-resolution policy
    pub models: ModelCatalog,
    /// Timeout budgets per operation weight
    pub timeouts: TimeoutConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Gemini API configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; `None` leaves every operation failing with `ConfigurationMissing`
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Model identifiers for the two tiers and the escalation threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    /// Model serving the "fast" tier
    pub fast_model: String,
    /// Model serving the "advanced" tier
    pub advanced_model: String,
    /// Line count above which code-bearing operations use the advanced tier
    pub advanced_line_threshold: usize,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            fast_model: "gemini-2.5-flash".to_string(),
            advanced_model: "gemini-2.5-pro".to_string(),
            advanced_line_threshold: DEFAULT_ADVANCED_LINE_THRESHOLD,
        }
    }
}

/// Timeout budgets (in seconds) for light, standard and heavy operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Chat follow-ups, hints, grading
    pub light_secs: u64,
    /// Single-artifact generation (debug, examples, simulation)
    pub standard_secs: u64,
    /// Full analyses and whole-project operations
    pub heavy_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            light_secs: 45,
            standard_secs: 90,
            heavy_secs: 180,
        }
    }
}

impl TimeoutConfig {
    /// Budget for light operations
    pub fn light(&self) -> Duration {
        Duration::from_secs(self.light_secs)
    }

    /// Budget for standard operations
    pub fn standard(&self) -> Duration {
        Duration::from_secs(self.standard_secs)
    }

    /// Budget for heavy operations
    pub fn heavy(&self) -> Duration {
        Duration::from_secs(self.heavy_secs)
    }
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Base directory for activity history and settings
    pub data_dir: PathBuf,
}

impl PersistenceConfig {
    /// Path of the activity history document
    pub fn activities_path(&self) -> PathBuf {
        self.data_dir.join("activities.json")
    }

    /// Path of the user settings document
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let catalog = ModelCatalog::default();
        let timeouts = TimeoutConfig::default();

        Self {
            server: ServerConfig {
                port: env_parse("PORT", 8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            gemini: GeminiConfig {
                api_key: env::var("GEMINI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                base_url: env::var("GEMINI_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE_URL.to_string()),
            },
            models: ModelCatalog {
                fast_model: env::var("TUTOR_FAST_MODEL").unwrap_or(catalog.fast_model),
                advanced_model: env::var("TUTOR_ADVANCED_MODEL")
                    .unwrap_or(catalog.advanced_model),
                advanced_line_threshold: env_parse(
                    "TUTOR_ADVANCED_LINE_THRESHOLD",
                    catalog.advanced_line_threshold,
                ),
            },
            timeouts: TimeoutConfig {
                light_secs: env_parse("TUTOR_TIMEOUT_LIGHT_SECS", timeouts.light_secs),
                standard_secs: env_parse("TUTOR_TIMEOUT_STANDARD_SECS", timeouts.standard_secs),
                heavy_secs: env_parse("TUTOR_TIMEOUT_HEAVY_SECS", timeouts.heavy_secs),
            },
            persistence: PersistenceConfig {
                data_dir: env::var_os("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| {
                        // Default to ~/.code-tutor or current directory
                        if let Some(home) = env::var_os("HOME") {
                            PathBuf::from(home).join(".code-tutor")
                        } else {
                            PathBuf::from(".code-tutor")
                        }
                    }),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
