//! # Project State
//!
//! The project record for one factory run and the log entries it collects.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::skills::{AuditReport, TechnicalPlan};
use crate::swarm::PipelineStage;

/// Placeholder name until research names the project
pub const PLACEHOLDER_NAME: &str = "Initializing...";

/// Severity/category of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One immutable line of the run log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    /// Position in the run, strictly increasing
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub agent_name: String,
    pub message: String,
    #[serde(rename = "type")]
    pub level: LogLevel,
    /// Set on the single entry that ends a run
    #[serde(default)]
    pub terminal: bool,
}

impl LogEntry {
    /// Wall-clock time for display (HH:MM:SS)
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// A produced file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Artifact {
    /// Relative path, unique within a project
    pub path: String,
    /// Full text content
    pub content: String,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Run status of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    InProgress,
    Completed,
    /// Partial data kept, deliverable incomplete
    Failed,
}

/// The in-progress deliverable of one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub concept: String,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub presentation: String,
    #[serde(default)]
    pub technical_plan: Option<TechnicalPlan>,
    #[serde(default)]
    pub code_files: Vec<Artifact>,
    #[serde(default)]
    pub last_audit: Option<AuditReport>,
    #[serde(default)]
    pub audit_attempts: u32,
    #[serde(default)]
    pub vercel_url: Option<String>,
    pub logs: Vec<LogEntry>,
    pub current_stage: PipelineStage,
    #[serde(default)]
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Empty project with a placeholder name
    pub fn placeholder() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: PLACEHOLDER_NAME.to_string(),
            concept: String::new(),
            pain_points: Vec::new(),
            solutions: Vec::new(),
            features: Vec::new(),
            presentation: String::new(),
            technical_plan: None,
            code_files: Vec::new(),
            last_audit: None,
            audit_attempts: 0,
            vercel_url: None,
            logs: Vec::new(),
            current_stage: PipelineStage::Research,
            status: ProjectStatus::InProgress,
            created_at: Utc::now(),
        }
    }

    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn artifact(&self, path: &str) -> Option<&Artifact> {
        self.code_files.iter().find(|f| f.path == path)
    }

    /// The entry that closed the run, if it has closed
    pub fn terminal_entry(&self) -> Option<&LogEntry> {
        self.logs.iter().rev().find(|e| e.terminal)
    }
}

/// Lower-case, whitespace runs collapsed to single hyphens
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Aurora"), "aurora");
        assert_eq!(slugify("  Hive   Mind Social "), "hive-mind-social");
        assert_eq!(slugify("Tab\tSeparated"), "tab-separated");
    }

    #[test]
    fn test_project_wire_names() {
        let project = Project::placeholder();
        let json = serde_json::to_value(&project).unwrap();
        assert!(json.get("codeFiles").is_some());
        assert!(json.get("currentStage").is_some());
        assert!(json.get("painPoints").is_some());
        assert_eq!(json["currentStage"], "RESEARCH");
        assert_eq!(json["status"], "IN_PROGRESS");
    }

    #[test]
    fn test_log_level_serialization() {
        let json = serde_json::to_string(&LogLevel::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
