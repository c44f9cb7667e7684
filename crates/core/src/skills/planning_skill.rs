//! # Planning Skill
//!
//! Technical plan for a researched concept.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::research_skill::ResearchResult;
use super::structured::StructuredOutput;

/// Output from the planning skill
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalPlan {
    /// Product requirements
    pub prd: String,
    /// Technical context, constraints, dependencies
    pub context: String,
    /// Pages and user journeys
    pub sitemap: String,
    /// Text ERD
    pub db_schema: String,
}

impl StructuredOutput for TechnicalPlan {}

pub(crate) fn prompt(research: &ResearchResult) -> String {
    let project = serde_json::to_string_pretty(research).unwrap_or_default();
    prompts::render(
        prompts::PLANNING,
        &[("name", research.name.as_str()), ("project", project.as_str())],
    )
}
