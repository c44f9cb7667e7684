//! # Coding Skill
//!
//! Produces the whole artifact set (source plus documents) in one call.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::planning_skill::TechnicalPlan;
use super::prompts;
use super::research_skill::ResearchResult;
use super::structured::StructuredOutput;
use crate::state::Artifact;

/// Output from the coding skill
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CodeBundle {
    pub files: Vec<Artifact>,
}

impl StructuredOutput for CodeBundle {
    fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("no files generated".to_string());
        }
        let mut seen = HashSet::new();
        for (idx, file) in self.files.iter().enumerate() {
            if file.path.trim().is_empty() {
                return Err(format!("file #{} has an empty path", idx));
            }
            if file.content.trim().is_empty() {
                return Err(format!("file '{}' has no content", file.path));
            }
            if !seen.insert(file.path.as_str()) {
                return Err(format!("duplicate path '{}'", file.path));
            }
        }
        Ok(())
    }
}

pub(crate) fn prompt(
    research: &ResearchResult,
    plan: &TechnicalPlan,
    feedback: Option<&str>,
    expected_files: usize,
) -> String {
    let project = serde_json::to_string_pretty(research).unwrap_or_default();
    let plan = serde_json::to_string_pretty(plan).unwrap_or_default();
    let feedback = match feedback {
        Some(notes) if !notes.trim().is_empty() => format!(
            "The previous artifact set failed the structural audit. Fix these findings:\n{}",
            notes.trim()
        ),
        _ => String::new(),
    };
    let file_count = expected_files.to_string();
    prompts::render(
        prompts::CODING,
        &[
            ("project", project.as_str()),
            ("plan", plan.as_str()),
            ("feedback", feedback.as_str()),
            ("file_count", file_count.as_str()),
        ],
    )
}
