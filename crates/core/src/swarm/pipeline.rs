//! # Pipeline Stages
//!
//! Defines the stages of the factory pipeline and the state machine that
//! walks them, including the bounded CODING ⇄ QA loop.

use serde::{Deserialize, Serialize};

/// Stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    /// Market research and concept
    Research,
    /// PRD, context, sitemap and data schema
    Planning,
    /// Architecture consolidation from the plan
    Architecture,
    /// Source and document generation
    Coding,
    /// Structural audit (quality gate)
    Qa,
    /// Preview deployment
    Deployment,
}

impl PipelineStage {
    pub fn ordered() -> [PipelineStage; 6] {
        [
            PipelineStage::Research,
            PipelineStage::Planning,
            PipelineStage::Architecture,
            PipelineStage::Coding,
            PipelineStage::Qa,
            PipelineStage::Deployment,
        ]
    }

    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Research => Some(PipelineStage::Planning),
            PipelineStage::Planning => Some(PipelineStage::Architecture),
            PipelineStage::Architecture => Some(PipelineStage::Coding),
            PipelineStage::Coding => Some(PipelineStage::Qa),
            PipelineStage::Qa => Some(PipelineStage::Deployment),
            PipelineStage::Deployment => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Research => "research",
            PipelineStage::Planning => "planning",
            PipelineStage::Architecture => "architecture",
            PipelineStage::Coding => "coding",
            PipelineStage::Qa => "qa",
            PipelineStage::Deployment => "deployment",
        }
    }
}

/// Where the run is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "stage", rename_all = "snake_case")]
pub enum PipelinePhase {
    /// Not started
    Idle,
    /// Working on a stage
    Active(PipelineStage),
    /// Deployment finished
    Completed,
    /// Terminal failure, with the stage it happened in
    Failed(PipelineStage),
}

/// The pipeline state machine
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Current phase
    pub phase: PipelinePhase,
    /// Audits performed in this run
    pub audit_attempts: u32,
    /// Maximum audits before the gate gives up
    pub max_audit_attempts: u32,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Pipeline {
    pub fn new(max_audit_attempts: u32) -> Self {
        Self {
            phase: PipelinePhase::Idle,
            audit_attempts: 0,
            max_audit_attempts: max_audit_attempts.max(1),
        }
    }

    /// Back to IDLE, then into RESEARCH
    pub fn start(&mut self) {
        self.audit_attempts = 0;
        self.phase = PipelinePhase::Active(PipelineStage::Research);
    }

    /// Stage currently being worked on, if any
    pub fn stage(&self) -> Option<PipelineStage> {
        match self.phase {
            PipelinePhase::Active(stage) => Some(stage),
            _ => None,
        }
    }

    /// Advance to the next stage (or COMPLETED after deployment)
    pub fn advance(&mut self) {
        self.phase = match self.phase {
            PipelinePhase::Active(stage) => match stage.next() {
                Some(next) => PipelinePhase::Active(next),
                None => PipelinePhase::Completed,
            },
            other => other,
        };
    }

    /// Count an audit
    pub fn record_audit(&mut self) -> u32 {
        self.audit_attempts += 1;
        self.audit_attempts
    }

    /// Handle a failed audit - loop back to CODING while attempts remain.
    /// Returns false once the bound is exhausted; the phase is left in QA
    /// for the caller's exhaustion policy.
    pub fn reject_audit(&mut self) -> bool {
        if self.audit_attempts >= self.max_audit_attempts {
            false
        } else {
            self.phase = PipelinePhase::Active(PipelineStage::Coding);
            true
        }
    }

    /// Fail the pipeline in the current stage
    pub fn fail(&mut self) -> PipelineStage {
        let stage = match self.phase {
            PipelinePhase::Active(stage) | PipelinePhase::Failed(stage) => stage,
            PipelinePhase::Idle => PipelineStage::Research,
            PipelinePhase::Completed => PipelineStage::Deployment,
        };
        self.phase = PipelinePhase::Failed(stage);
        stage
    }

    /// Check if pipeline reached a terminal phase
    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            PipelinePhase::Completed | PipelinePhase::Failed(_)
        )
    }

    /// Check if pipeline succeeded
    pub fn is_success(&self) -> bool {
        self.phase == PipelinePhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_advance() {
        let mut pipeline = Pipeline::new(2);
        assert_eq!(pipeline.phase, PipelinePhase::Idle);

        pipeline.start();
        assert_eq!(pipeline.stage(), Some(PipelineStage::Research));

        pipeline.advance();
        assert_eq!(pipeline.stage(), Some(PipelineStage::Planning));

        for _ in 0..4 {
            pipeline.advance();
        }
        assert_eq!(pipeline.stage(), Some(PipelineStage::Deployment));

        pipeline.advance();
        assert!(pipeline.is_success());
        assert!(pipeline.is_finished());
    }

    #[test]
    fn test_audit_rejection_loop_is_bounded() {
        let mut pipeline = Pipeline::new(2);
        pipeline.phase = PipelinePhase::Active(PipelineStage::Qa);

        // First failed audit - loop back
        pipeline.record_audit();
        assert!(pipeline.reject_audit());
        assert_eq!(pipeline.stage(), Some(PipelineStage::Coding));

        // Second failed audit - exhausted
        pipeline.phase = PipelinePhase::Active(PipelineStage::Qa);
        pipeline.record_audit();
        assert!(!pipeline.reject_audit());
        assert_eq!(pipeline.stage(), Some(PipelineStage::Qa));
    }

    #[test]
    fn test_fail_records_stage() {
        let mut pipeline = Pipeline::new(2);
        pipeline.start();
        pipeline.advance();
        assert_eq!(pipeline.fail(), PipelineStage::Planning);
        assert_eq!(pipeline.phase, PipelinePhase::Failed(PipelineStage::Planning));
        assert!(!pipeline.is_success());
    }

    #[test]
    fn test_start_resets_attempts() {
        let mut pipeline = Pipeline::new(3);
        pipeline.record_audit();
        pipeline.start();
        assert_eq!(pipeline.audit_attempts, 0);
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&PipelineStage::Qa).unwrap();
        assert_eq!(json, "\"QA\"");
    }
}
