//! # Audit Skill
//!
//! Structural audit of an artifact set. A `Fail` verdict is a normal
//! outcome; the coordinator's quality gate decides what happens next.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use super::prompts;
use super::structured::StructuredOutput;
use crate::state::Artifact;

/// Characters of each file shown to the auditor
const EXCERPT_CHARS: usize = 1500;

/// Audit verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum AuditVerdict {
    Pass,
    Fail,
}

impl<'de> Deserialize<'de> for AuditVerdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(AuditVerdict::Pass),
            "fail" => Ok(AuditVerdict::Fail),
            other => Err(serde::de::Error::custom(format!(
                "unknown audit status '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AuditVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditVerdict::Pass => f.write_str("Pass"),
            AuditVerdict::Fail => f.write_str("Fail"),
        }
    }
}

/// Output from the audit skill
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditReport {
    pub status: AuditVerdict,
    /// Remediation notes
    pub notes: String,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.status == AuditVerdict::Pass
    }
}

impl StructuredOutput for AuditReport {}

fn excerpt(content: &str) -> String {
    let mut out: String = content.chars().take(EXCERPT_CHARS).collect();
    if content.chars().count() > EXCERPT_CHARS {
        out.push_str("\n...[truncated]");
    }
    out
}

pub(crate) fn prompt(files: &[Artifact]) -> String {
    let manifest = files
        .iter()
        .map(|f| {
            format!(
                "### {} ({} bytes)\n```\n{}\n```",
                f.path,
                f.content.len(),
                excerpt(&f.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    prompts::render(prompts::AUDIT, &[("files", manifest.as_str())])
}
