// Activity history
// One record per user submission, updated in place once its result arrives

use crate::error::AppError;
use crate::tutor::{
    AnalysisResult, ChatMessage, DebugResult, Difficulty, Language, ProjectAnalysis,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of activities retained; the oldest are evicted first
pub const MAX_ACTIVITIES: usize = 50;

const TITLE_MAX_CHARS: usize = 60;
const SUMMARY_MAX_CHARS: usize = 160;

/// Unique identifier for an activity
pub type ActivityId = String;

/// What the user submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    /// Uploaded source file
    FileAnalysis,
    /// Concept described in prose
    ConceptAnalysis,
    /// Pasted code
    PasteAnalysis,
    /// Debugging request
    DebugAnalysis,
    /// Uploaded project
    ProjectAnalysis,
    /// Screenshot or photo of code
    ImageAnalysis,
    /// Preference change
    SettingsUpdate,
}

impl ActivityKind {
    /// Label used in titles
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::FileAnalysis => "File",
            ActivityKind::ConceptAnalysis => "Concept",
            ActivityKind::PasteAnalysis => "Code",
            ActivityKind::DebugAnalysis => "Debug",
            ActivityKind::ProjectAnalysis => "Project",
            ActivityKind::ImageAnalysis => "Image",
            ActivityKind::SettingsUpdate => "Settings",
        }
    }

    /// Display icon name
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::FileAnalysis => "file-code",
            ActivityKind::ConceptAnalysis => "lightbulb",
            ActivityKind::PasteAnalysis => "clipboard",
            ActivityKind::DebugAnalysis => "bug",
            ActivityKind::ProjectAnalysis => "folder-tree",
            ActivityKind::ImageAnalysis => "image",
            ActivityKind::SettingsUpdate => "settings",
        }
    }

    /// Display colour
    pub fn color(&self) -> &'static str {
        match self {
            ActivityKind::FileAnalysis => "#3b82f6",
            ActivityKind::ConceptAnalysis => "#eab308",
            ActivityKind::PasteAnalysis => "#8b5cf6",
            ActivityKind::DebugAnalysis => "#ef4444",
            ActivityKind::ProjectAnalysis => "#10b981",
            ActivityKind::ImageAnalysis => "#ec4899",
            ActivityKind::SettingsUpdate => "#6b7280",
        }
    }
}

/// Structured result attached to a completed activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ActivityResult {
    /// Code, concept, file or image analysis
    Analysis(AnalysisResult),
    /// Debugging result
    Debug(DebugResult),
    /// Project analysis
    Project(ProjectAnalysis),
}

impl ActivityResult {
    fn summary(&self) -> String {
        let text = match self {
            ActivityResult::Analysis(analysis) => &analysis.topic_explanation.core_concepts,
            ActivityResult::Debug(debug) => &debug.summary,
            ActivityResult::Project(project) => &project.overview,
        };
        truncate(first_line(text), SUMMARY_MAX_CHARS)
    }

    fn language(&self) -> Option<Language> {
        match self {
            ActivityResult::Analysis(analysis) => Some(analysis.language),
            ActivityResult::Debug(debug) => debug.detected_language,
            ActivityResult::Project(_) => None,
        }
    }
}

/// One user session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    /// Unique identifier
    pub id: ActivityId,
    /// Kind of submission
    pub kind: ActivityKind,
    /// Short title
    pub title: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Short summary; refreshed when the result arrives
    pub summary: String,
    /// Display icon
    pub icon: String,
    /// Display colour
    pub color: String,
    /// Requested or detected language
    pub language: Language,
    /// Original input (code, concept text or project name)
    pub input: String,
    /// Reference to the submitted image, when there was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Result, once the remote call resolved
    #[serde(default)]
    pub result: Option<ActivityResult>,
    /// Requested difficulty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Follow-up conversation (project conversations live in the project result)
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

impl ActivityItem {
    /// Create a pending activity for a submission
    pub fn new(
        kind: ActivityKind,
        input: impl Into<String>,
        language: Language,
        difficulty: Option<Difficulty>,
    ) -> Self {
        let input = input.into();
        let title = match kind {
            ActivityKind::ProjectAnalysis => format!("Project: {}", input.trim()),
            ActivityKind::ImageAnalysis if input.trim().is_empty() => "Image".to_string(),
            _ => format!("{}: {}", kind.label(), first_line(&input)),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: truncate(&title, TITLE_MAX_CHARS),
            created_at: Utc::now(),
            summary: "Analysis in progress".to_string(),
            icon: kind.icon().to_string(),
            color: kind.color().to_string(),
            language,
            input,
            image_ref: None,
            result: None,
            difficulty,
            chat_history: Vec::new(),
        }
    }

    /// Record of a settings change
    pub fn settings_update(summary: impl Into<String>) -> Self {
        let mut item = Self::new(ActivityKind::SettingsUpdate, "", Language::Unknown, None);
        item.title = "Settings updated".to_string();
        item.summary = truncate(&summary.into(), SUMMARY_MAX_CHARS);
        item
    }

    /// Title the activity after `subject` instead of the input's first line
    pub fn with_title_subject(mut self, subject: &str) -> Self {
        let title = format!("{}: {}", self.kind.label(), subject.trim());
        self.title = truncate(&title, TITLE_MAX_CHARS);
        self
    }

    /// Attach an image reference
    pub fn with_image_ref(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Whether the result has arrived
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Follow-up conversation for this activity
    pub fn chat(&self) -> &[ChatMessage] {
        match &self.result {
            Some(ActivityResult::Project(project)) => {
                project.chat_history.as_deref().unwrap_or(&[])
            }
            _ => &self.chat_history,
        }
    }
}

/// Capped, newest-first activity collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLog {
    items: Vec<ActivityItem>,
}

impl ActivityLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored items, re-sorting and re-applying the cap
    pub fn from_items(mut items: Vec<ActivityItem>) -> Self {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(MAX_ACTIVITIES);
        Self { items }
    }

    /// Insert an activity, evicting the oldest beyond the cap
    pub fn insert(&mut self, item: ActivityItem) {
        let position = self
            .items
            .iter()
            .position(|existing| existing.created_at <= item.created_at)
            .unwrap_or(self.items.len());
        self.items.insert(position, item);
        if self.items.len() > MAX_ACTIVITIES {
            let evicted = self.items.split_off(MAX_ACTIVITIES);
            tracing::debug!(evicted = evicted.len(), "Evicted oldest activities");
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut ActivityItem, AppError> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| AppError::ActivityNotFound(id.to_string()))
    }

    /// Attach a result in place and refresh the summary
    pub fn update_result(&mut self, id: &str, result: ActivityResult) -> Result<&ActivityItem, AppError> {
        let item = self.get_mut(id)?;
        item.summary = result.summary();
        if !item.language.is_known() {
            if let Some(language) = result.language() {
                item.language = language;
            }
        }
        item.result = Some(result);
        Ok(item)
    }

    /// Modify the project result of a project activity in place
    pub fn update_project<F>(&mut self, id: &str, update: F) -> Result<&ActivityItem, AppError>
    where
        F: FnOnce(&mut ProjectAnalysis),
    {
        let item = self.get_mut(id)?;
        match item.result.as_mut() {
            Some(ActivityResult::Project(project)) => update(project),
            _ => {
                return Err(AppError::InvalidInput(format!(
                    "activity {} has no project analysis",
                    id
                )))
            }
        }
        Ok(item)
    }

    /// Append follow-up messages to an activity's conversation
    pub fn append_chat(
        &mut self,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<&ActivityItem, AppError> {
        let item = self.get_mut(id)?;
        match item.result.as_mut() {
            Some(ActivityResult::Project(project)) => project
                .chat_history
                .get_or_insert_with(Vec::new)
                .extend(messages),
            _ => item.chat_history.extend(messages),
        }
        Ok(item)
    }

    /// Look up an activity
    pub fn get(&self, id: &str) -> Option<&ActivityItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All activities, newest first
    pub fn list(&self) -> &[ActivityItem] {
        &self.items
    }

    /// Number of activities
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove every activity
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
