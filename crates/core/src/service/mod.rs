//! # Service Boundary
//!
//! The external collaborators the coordinator calls into: the generative
//! text/JSON service and the deployment target.
//!
//! - `gemini` - Live reqwest client for the Gemini `generateContent` API
//! - `scripted` - Canned replies for tests and offline runs
//! - `deploy` - Preview deployment URLs

pub mod deploy;
pub mod gemini;
pub mod scripted;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ForgeError, Operation};

pub use deploy::{DeploymentTarget, PreviewDeployment};
pub use gemini::GeminiService;
pub use scripted::{ScriptedReply, ScriptedService};

/// One structured generation call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub operation: Operation,
    pub model: String,
    pub thinking_budget: Option<u32>,
    /// Natural-language instruction
    pub prompt: String,
    /// Declared JSON shape of the response
    pub schema: Value,
}

/// A generative backend that answers a prompt with JSON text
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Return the raw JSON text of the response. Decoding against the
    /// declared shape happens in the caller.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ForgeError>;
}
