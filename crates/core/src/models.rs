//! # Forge Models
//!
//! Model selection for the four generative operations. Research, planning
//! and audit run on a fast model; code generation gets the larger model and
//! a thinking budget.

use serde::{Deserialize, Serialize};

use crate::error::Operation;

pub const DEFAULT_FAST_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_CODE_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_CODE_THINKING_BUDGET: u32 = 4000;

/// Configuration for a single model call
///
/// ## Example
/// ```rust,ignore
/// use forge_core::models::ModelConfig;
///
/// let fast = ModelConfig::new("gemini-3-flash-preview");
/// let deep = ModelConfig::new("gemini-3-pro-preview").with_thinking_budget(4000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelConfig {
    /// Model name (e.g., "gemini-3-flash-preview")
    pub model: String,
    /// Optional reasoning token budget
    #[serde(default)]
    pub thinking_budget: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FAST_MODEL)
    }
}

impl ModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            thinking_budget: None,
        }
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

/// Per-operation model overrides
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelSet {
    pub research: ModelConfig,
    pub planning: ModelConfig,
    pub coding: ModelConfig,
    pub audit: ModelConfig,
}

impl Default for ModelSet {
    fn default() -> Self {
        Self {
            research: ModelConfig::default(),
            planning: ModelConfig::default(),
            coding: ModelConfig::new(DEFAULT_CODE_MODEL)
                .with_thinking_budget(DEFAULT_CODE_THINKING_BUDGET),
            audit: ModelConfig::default(),
        }
    }
}

impl ModelSet {
    /// Same model everywhere (thinking budget kept for code generation)
    pub fn uniform(model: &str) -> Self {
        let mut set = Self::default();
        set.research = ModelConfig::new(model);
        set.planning = ModelConfig::new(model);
        set.coding.model = model.to_string();
        set.audit = ModelConfig::new(model);
        set
    }

    pub fn for_operation(&self, operation: Operation) -> &ModelConfig {
        match operation {
            Operation::Research => &self.research,
            Operation::TechnicalPlan => &self.planning,
            Operation::CodeGeneration => &self.coding,
            Operation::Audit => &self.audit,
        }
    }
}
