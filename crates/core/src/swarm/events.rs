//! # Swarm Events
//!
//! Live updates published while a run progresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of swarm event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwarmEventKind {
    /// Run started
    PipelineStarted,
    /// Agent started working
    AgentStarted,
    /// Agent completed successfully
    AgentCompleted,
    /// Agent was in flight when the run failed
    AgentFailed,
    /// Entry appended to the project log
    LogAppended,
    /// Stage work recorded, moving on
    StageCompleted,
    /// Audit returned Fail, looping back to coding
    AuditRejected,
    /// Run completed
    PipelineCompleted,
    /// Run failed or was cancelled
    PipelineFailed,
    /// Start requested while another run was active
    RunRejected,
}

/// An event in the swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: SwarmEventKind,
    /// Agent id, or "coordinator"
    pub agent: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl SwarmEvent {
    pub fn new(kind: SwarmEventKind, agent: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            agent: agent.to_string(),
            data: None,
        }
    }

    /// Attach a JSON payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
