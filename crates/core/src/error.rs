//! # Forge Errors
//!
//! One error type for the whole factory floor. Audit rejections are not
//! errors; they are handled by the quality-gate loop in the coordinator.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying cause of a service failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The four calls made against the generative service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Research,
    TechnicalPlan,
    CodeGeneration,
    Audit,
}

impl Operation {
    pub fn all() -> [Operation; 4] {
        [
            Operation::Research,
            Operation::TechnicalPlan,
            Operation::CodeGeneration,
            Operation::Audit,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Research => "research",
            Operation::TechnicalPlan => "technical_plan",
            Operation::CodeGeneration => "code_generation",
            Operation::Audit => "audit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ForgeError {
    /// Missing or invalid credential/settings. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network failure, timeout or non-2xx response
    #[error("{operation} request failed: {source}")]
    Service {
        operation: Operation,
        #[source]
        source: BoxError,
    },

    /// Response arrived but did not match the declared shape
    #[error("{operation} returned malformed data: {detail}")]
    SchemaViolation { operation: Operation, detail: String },

    #[error("run cancelled")]
    Cancelled,

    #[error("quality gate still failing after {attempts} audit(s): {notes}")]
    QualityGateExhausted { attempts: u32, notes: String },

    #[error("export failed: {0}")]
    Export(String),
}

impl ForgeError {
    pub fn service(operation: Operation, source: impl Into<BoxError>) -> Self {
        ForgeError::Service {
            operation,
            source: source.into(),
        }
    }

    pub fn schema(operation: Operation, detail: impl Into<String>) -> Self {
        ForgeError::SchemaViolation {
            operation,
            detail: detail.into(),
        }
    }

    pub fn timeout(operation: Operation, after: Duration) -> Self {
        Self::service(
            operation,
            format!("no response within {:.1}s", after.as_secs_f64()),
        )
    }

    /// Operator-facing line for the run log. Keeps "service down" and
    /// "service returned garbage" apart.
    pub fn log_message(&self) -> String {
        match self {
            ForgeError::Service { operation, source } => {
                format!("Service failure during {}: {}", operation, source)
            }
            ForgeError::SchemaViolation { operation, detail } => {
                format!("Malformed {} response: {}", operation, detail)
            }
            ForgeError::Cancelled => "Run cancelled".to_string(),
            other => format!("Error: {}", other),
        }
    }
}

impl From<std::io::Error> for ForgeError {
    fn from(err: std::io::Error) -> Self {
        ForgeError::Export(err.to_string())
    }
}
