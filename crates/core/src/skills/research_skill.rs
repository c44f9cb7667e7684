//! # Research Skill
//!
//! Market scan: turns a free-text market descriptor into a named concept
//! with pain points, solutions and MVP features.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::prompts;
use super::structured::StructuredOutput;

/// Output from the research skill
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    /// Project name
    pub name: String,
    /// Core idea
    pub concept: String,
    pub pain_points: Vec<String>,
    pub solutions: Vec<String>,
    /// Two-sentence pitch
    pub presentation: String,
    /// MVP features
    pub features: Vec<String>,
}

impl StructuredOutput for ResearchResult {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("research returned a blank project name".to_string());
        }
        Ok(())
    }
}

pub(crate) fn prompt(market: &str) -> String {
    prompts::render(prompts::RESEARCH, &[("market", market)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ForgeError, Operation};
    use crate::skills::structured::decode;

    #[test]
    fn test_missing_pain_points_is_rejected() {
        let raw = r#"{"name":"Aurora","concept":"c","solutions":["s1"],"presentation":"x","features":["f1"]}"#;
        let err = decode::<ResearchResult>(Operation::Research, raw).unwrap_err();
        assert!(matches!(err, ForgeError::SchemaViolation { .. }));
        assert!(err.to_string().contains("painPoints"));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let raw = r#"{"name":"  ","concept":"c","painPoints":[],"solutions":[],"presentation":"x","features":[]}"#;
        assert!(decode::<ResearchResult>(Operation::Research, raw).is_err());
    }

    #[test]
    fn test_prompt_mentions_market() {
        assert!(prompt("Urban Gardening").contains("Urban Gardening"));
    }
}
