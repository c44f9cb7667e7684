//! # Project Aggregator
//!
//! Single mutation point for the project record. Logs are append-only and
//! chronological; every other field is last-write-wins.

use chrono::Utc;

use super::project_state::{Artifact, LogEntry, LogLevel, Project, ProjectStatus};
use crate::skills::{AuditReport, ResearchResult, TechnicalPlan};
use crate::swarm::PipelineStage;

#[derive(Debug, Default, Clone)]
pub struct ProjectAggregator {
    project: Option<Project>,
}

impl ProjectAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Drop the current record; the next write starts a fresh one
    pub fn discard(&mut self) {
        self.project = None;
    }

    fn project_mut(&mut self) -> &mut Project {
        self.project.get_or_insert_with(Project::placeholder)
    }

    /// Append a log entry, creating the project on first use
    pub fn append_log(&mut self, agent_name: &str, message: &str, level: LogLevel) -> LogEntry {
        self.push_log(agent_name, message, level, false)
    }

    /// Append the entry that closes the run
    pub fn append_terminal_log(
        &mut self,
        agent_name: &str,
        message: &str,
        level: LogLevel,
    ) -> LogEntry {
        self.push_log(agent_name, message, level, true)
    }

    fn push_log(
        &mut self,
        agent_name: &str,
        message: &str,
        level: LogLevel,
        terminal: bool,
    ) -> LogEntry {
        let project = self.project_mut();
        let (sequence, floor) = match project.logs.last() {
            Some(last) => (last.sequence + 1, Some(last.timestamp)),
            None => (0, None),
        };

        // Clock steps backwards must not reorder the log
        let now = Utc::now();
        let timestamp = match floor {
            Some(floor) if floor > now => floor,
            _ => now,
        };

        let entry = LogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sequence,
            timestamp,
            agent_name: agent_name.to_string(),
            message: message.to_string(),
            level,
            terminal,
        };
        project.logs.push(entry.clone());
        entry
    }

    pub fn merge_research(&mut self, research: &ResearchResult) {
        let project = self.project_mut();
        project.name = research.name.clone();
        project.concept = research.concept.clone();
        project.pain_points = research.pain_points.clone();
        project.solutions = research.solutions.clone();
        project.features = research.features.clone();
        project.presentation = research.presentation.clone();
    }

    pub fn merge_plan(&mut self, plan: &TechnicalPlan) {
        self.project_mut().technical_plan = Some(plan.clone());
    }

    /// Replace the artifact set wholesale
    pub fn set_artifacts(&mut self, files: Vec<Artifact>) {
        self.project_mut().code_files = files;
    }

    pub fn record_audit(&mut self, report: &AuditReport, attempts: u32) {
        let project = self.project_mut();
        project.last_audit = Some(report.clone());
        project.audit_attempts = attempts;
    }

    pub fn set_deployment_url(&mut self, url: &str) {
        self.project_mut().vercel_url = Some(url.to_string());
    }

    pub fn set_stage(&mut self, stage: PipelineStage) {
        self.project_mut().current_stage = stage;
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.project_mut().status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::AuditVerdict;
    use crate::state::project_state::PLACEHOLDER_NAME;

    fn research() -> ResearchResult {
        ResearchResult {
            name: "Aurora".to_string(),
            concept: "c".to_string(),
            pain_points: vec!["p1".to_string()],
            solutions: vec!["s1".to_string()],
            presentation: "x".to_string(),
            features: vec!["f1".to_string()],
        }
    }

    #[test]
    fn test_first_log_creates_placeholder_project() {
        let mut agg = ProjectAggregator::new();
        assert!(agg.project().is_none());

        agg.append_log("System", "hello", LogLevel::Info);
        let project = agg.project().unwrap();
        assert_eq!(project.name, PLACEHOLDER_NAME);
        assert_eq!(project.logs.len(), 1);
    }

    #[test]
    fn test_logs_are_ordered() {
        let mut agg = ProjectAggregator::new();
        for i in 0..20 {
            agg.append_log("System", &format!("line {}", i), LogLevel::Info);
        }
        let logs = &agg.project().unwrap().logs;
        for pair in logs.windows(2) {
            assert!(pair[0].sequence < pair[1].sequence);
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert_eq!(logs[7].message, "line 7");
    }

    #[test]
    fn test_merges_preserve_untouched_fields() {
        let mut agg = ProjectAggregator::new();
        agg.append_log("System", "start", LogLevel::Info);
        agg.merge_research(&research());
        agg.set_deployment_url("https://aurora.vercel.app");
        agg.merge_plan(&TechnicalPlan {
            prd: "prd".to_string(),
            context: "ctx".to_string(),
            sitemap: "map".to_string(),
            db_schema: "db".to_string(),
        });

        let project = agg.project().unwrap();
        assert_eq!(project.name, "Aurora");
        assert_eq!(project.pain_points, vec!["p1".to_string()]);
        assert_eq!(project.vercel_url.as_deref(), Some("https://aurora.vercel.app"));
        assert_eq!(project.technical_plan.as_ref().unwrap().db_schema, "db");
        assert_eq!(project.logs.len(), 1);
    }

    #[test]
    fn test_artifacts_replaced_not_merged() {
        let mut agg = ProjectAggregator::new();
        agg.set_artifacts(vec![
            Artifact::new("App.tsx", "v1"),
            Artifact::new("README.md", "docs"),
        ]);
        agg.set_artifacts(vec![Artifact::new("App.tsx", "v2")]);

        let project = agg.project().unwrap();
        assert_eq!(project.code_files.len(), 1);
        assert_eq!(project.artifact("App.tsx").unwrap().content, "v2");
        assert!(project.artifact("README.md").is_none());
    }

    #[test]
    fn test_record_audit_and_terminal_entry() {
        let mut agg = ProjectAggregator::new();
        agg.record_audit(
            &AuditReport {
                status: AuditVerdict::Fail,
                notes: "missing README".to_string(),
            },
            1,
        );
        agg.append_log("Agent Sentry", "audit failed", LogLevel::Warning);
        agg.append_terminal_log("Coordinator", "done", LogLevel::Error);

        let project = agg.project().unwrap();
        assert_eq!(project.audit_attempts, 1);
        assert_eq!(project.terminal_entry().unwrap().message, "done");
        assert_eq!(project.logs.iter().filter(|e| e.terminal).count(), 1);
    }

    #[test]
    fn test_discard_starts_fresh() {
        let mut agg = ProjectAggregator::new();
        agg.append_log("System", "old", LogLevel::Info);
        let old_id = agg.project().unwrap().id.clone();

        agg.discard();
        agg.append_log("System", "new", LogLevel::Info);
        let project = agg.project().unwrap();
        assert_ne!(project.id, old_id);
        assert_eq!(project.logs.len(), 1);
        assert_eq!(project.logs[0].sequence, 0);
    }
}
