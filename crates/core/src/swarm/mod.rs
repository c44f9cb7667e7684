//! # Swarm Orchestration
//!
//! Coordinates the agent pipeline for the factory.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Research → Planning → Architecture → Coding ⟷ QA → Deployment
//! ```

pub mod coordinator;
pub mod events;
pub mod pipeline;

pub use coordinator::{
    Coordinator, CoordinatorConfig, FactorySnapshot, Handoff, RunOutcome, RunReport,
};
pub use events::{SwarmEvent, SwarmEventKind};
pub use pipeline::{Pipeline, PipelinePhase, PipelineStage};
