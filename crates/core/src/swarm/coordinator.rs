//! # Swarm Coordinator
//!
//! Drives one factory run from market descriptor to preview deployment.
//! Stages run strictly in sequence with one external call in flight at a
//! time. The state lock is never held across an await on the service, so a
//! snapshot taken mid-run sees every step recorded so far.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use super::events::{SwarmEvent, SwarmEventKind};
use super::pipeline::{Pipeline, PipelinePhase, PipelineStage};
use crate::agents::{Agent, AgentRegistry, AgentStatus};
use crate::config::{AuditExhaustionPolicy, FactorySettings};
use crate::error::ForgeError;
use crate::service::{DeploymentTarget, PreviewDeployment};
use crate::skills::{ArtifactClient, AuditReport};
use crate::state::{LogEntry, LogLevel, Project, ProjectAggregator, ProjectStatus};

const COORDINATOR: &str = "coordinator";
/// Author of the entry that closes a run
const SYSTEM: &str = "System";

const RESEARCH_CREW: &[&str] = &["echo", "analyst"];
const PLANNING_CREW: &[&str] = &["blueprint"];
const ARCHITECTURE_CREW: &[&str] = &["nexus", "growth"];
const CODING_CREW: &[&str] = &["forge", "scribe"];
const QA_CREW: &[&str] = &["sentry"];
const DEPLOYMENT_CREW: &[&str] = &["orbit"];

/// Configuration for the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Audits allowed before the quality gate gives up
    pub max_audit_attempts: u32,
    pub on_audit_exhausted: AuditExhaustionPolicy,
}

impl From<&FactorySettings> for CoordinatorConfig {
    fn from(settings: &FactorySettings) -> Self {
        Self {
            max_audit_attempts: settings.max_audit_attempts,
            on_audit_exhausted: settings.on_audit_exhausted,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&FactorySettings::default())
    }
}

/// Which agent is currently handing work to which. Visualization only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handoff {
    pub from: String,
    pub to: String,
}

/// Read-only view for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorySnapshot {
    pub agents: Vec<Agent>,
    pub project: Option<Project>,
    pub handoff: Option<Handoff>,
    pub phase: PipelinePhase,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed { stage: PipelineStage, reason: String },
    Cancelled,
    /// Another run was active; nothing happened
    Rejected,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Final project record, partial when the run failed
    pub project: Option<Project>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

#[derive(Debug)]
struct FactoryState {
    registry: AgentRegistry,
    aggregator: ProjectAggregator,
    pipeline: Pipeline,
    handoff: Option<Handoff>,
}

impl FactoryState {
    fn new(max_audit_attempts: u32) -> Self {
        Self {
            registry: AgentRegistry::new(),
            aggregator: ProjectAggregator::new(),
            pipeline: Pipeline::new(max_audit_attempts),
            handoff: None,
        }
    }

    fn log(&mut self, agent_id: &str, message: &str, level: LogLevel) -> SwarmEvent {
        let name = self.registry.name_of(agent_id);
        let entry = self.aggregator.append_log(&name, message, level);
        log_event(agent_id, &entry)
    }
}

fn log_event(agent: &str, entry: &LogEntry) -> SwarmEvent {
    let mut event = SwarmEvent::new(SwarmEventKind::LogAppended, agent);
    event.data = serde_json::to_value(entry).ok();
    event
}

/// Releases the single-run flag, even if the run future is dropped
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Race an external call against cancellation
async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, ForgeError>>,
) -> Result<T, ForgeError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ForgeError::Cancelled),
        result = call => result,
    }
}

/// The swarm coordinator
pub struct Coordinator {
    config: CoordinatorConfig,
    client: ArtifactClient,
    deployer: Arc<dyn DeploymentTarget>,
    state: RwLock<FactoryState>,
    running: AtomicBool,
    event_tx: Option<mpsc::Sender<SwarmEvent>>,
}

impl Coordinator {
    pub fn new(client: ArtifactClient, settings: &FactorySettings) -> Self {
        let config = CoordinatorConfig::from(settings);
        Self {
            state: RwLock::new(FactoryState::new(config.max_audit_attempts)),
            config,
            client,
            deployer: Arc::new(PreviewDeployment::new(settings.deploy_domain.clone())),
            running: AtomicBool::new(false),
            event_tx: None,
        }
    }

    /// Set event channel for streaming events
    pub fn with_event_channel(mut self, tx: mpsc::Sender<SwarmEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn with_deployment_target(mut self, target: Arc<dyn DeploymentTarget>) -> Self {
        self.deployer = target;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> FactorySnapshot {
        let state = self.state.read().await;
        FactorySnapshot {
            agents: state.registry.all().to_vec(),
            project: state.aggregator.project().cloned(),
            handoff: state.handoff.clone(),
            phase: state.pipeline.phase,
        }
    }

    async fn emit(&self, event: SwarmEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    async fn publish(&self, events: Vec<SwarmEvent>) {
        for event in events {
            self.emit(event).await;
        }
    }

    /// Run the factory on a market descriptor.
    ///
    /// A start while another run is active is rejected, not queued. Every
    /// failure lands in the project log and leaves the partial record in
    /// place.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn run(&self, market: &str, cancel: CancellationToken) -> RunReport {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Run already in progress, start ignored");
            self.emit(
                SwarmEvent::new(SwarmEventKind::RunRejected, COORDINATOR)
                    .with_data(json!({ "market": market })),
            )
            .await;
            return RunReport {
                outcome: RunOutcome::Rejected,
                project: None,
            };
        }
        let _guard = RunGuard(&self.running);

        {
            let mut state = self.state.write().await;
            state.registry.reset();
            state.aggregator.discard();
            state.pipeline = Pipeline::new(self.config.max_audit_attempts);
            state.pipeline.start();
            state.handoff = None;
        }
        tracing::info!("Factory run started");
        self.emit(
            SwarmEvent::new(SwarmEventKind::PipelineStarted, COORDINATOR)
                .with_data(json!({ "market": market })),
        )
        .await;

        let outcome = match self.execute(market, &cancel).await {
            Ok(()) => self.finish().await,
            Err(err) => self.abort(err).await,
        };

        let project = self.state.read().await.aggregator.project().cloned();
        RunReport { outcome, project }
    }

    async fn execute(&self, market: &str, cancel: &CancellationToken) -> Result<(), ForgeError> {
        // RESEARCH
        self.begin_stage(
            PipelineStage::Research,
            None,
            RESEARCH_CREW,
            AgentStatus::Thinking,
            &format!("Research initiated for market \"{}\"", market),
        )
        .await;
        let research = guarded(cancel, self.client.perform_research(market)).await?;
        self.complete_stage(
            RESEARCH_CREW,
            &format!("Concept identified: {}", research.name),
            LogLevel::Success,
            |state| state.aggregator.merge_research(&research),
        )
        .await;

        // PLANNING
        self.begin_stage(
            PipelineStage::Planning,
            Some("analyst"),
            PLANNING_CREW,
            AgentStatus::Thinking,
            &format!("Drafting PRD and technical plan for {}", research.name),
        )
        .await;
        let plan = guarded(cancel, self.client.generate_technical_plan(&research)).await?;
        self.complete_stage(
            PLANNING_CREW,
            "Technical plan ready",
            LogLevel::Success,
            |state| state.aggregator.merge_plan(&plan),
        )
        .await;

        // ARCHITECTURE (local, no external call)
        self.begin_stage(
            PipelineStage::Architecture,
            Some("blueprint"),
            ARCHITECTURE_CREW,
            AgentStatus::Thinking,
            "Consolidating sitemap and data schema",
        )
        .await;
        if cancel.is_cancelled() {
            return Err(ForgeError::Cancelled);
        }
        let summary = format!(
            "Architecture consolidated: sitemap ({} lines), data schema ({} lines)",
            non_empty_lines(&plan.sitemap),
            non_empty_lines(&plan.db_schema)
        );
        self.complete_stage(ARCHITECTURE_CREW, &summary, LogLevel::Success, |_| {})
            .await;

        // CODING <-> QA
        let mut feedback: Option<String> = None;
        let files = loop {
            let (from, message) = match feedback {
                None => ("nexus", format!("Generating source and documents for {}", research.name)),
                Some(_) => ("sentry", format!("Regenerating {} with audit feedback", research.name)),
            };
            self.begin_stage(
                PipelineStage::Coding,
                Some(from),
                CODING_CREW,
                AgentStatus::Working,
                &message,
            )
            .await;
            let files = guarded(
                cancel,
                self.client
                    .generate_code(&research, &plan, feedback.as_deref()),
            )
            .await?;
            self.complete_stage(
                CODING_CREW,
                &format!("Generated {} files", files.len()),
                LogLevel::Success,
                |state| state.aggregator.set_artifacts(files.clone()),
            )
            .await;

            self.begin_stage(
                PipelineStage::Qa,
                Some("forge"),
                QA_CREW,
                AgentStatus::Thinking,
                &format!("Auditing {} files", files.len()),
            )
            .await;
            let report = guarded(cancel, self.client.audit_code(&files)).await?;

            if report.passed() {
                self.complete_stage(QA_CREW, "Audit passed", LogLevel::Success, |state| {
                    let attempts = state.pipeline.record_audit();
                    state.aggregator.record_audit(&report, attempts);
                })
                .await;
                break files;
            }

            let (retry, attempts) = self.reject_audit(&report).await;
            if retry {
                feedback = Some(report.notes);
                continue;
            }

            match self.config.on_audit_exhausted {
                AuditExhaustionPolicy::Halt => {
                    return Err(ForgeError::QualityGateExhausted {
                        attempts,
                        notes: report.notes,
                    });
                }
                AuditExhaustionPolicy::Proceed => {
                    let message = format!(
                        "Quality gate exhausted after {} audits, shipping last artifacts unapproved",
                        attempts
                    );
                    self.complete_stage(QA_CREW, &message, LogLevel::Warning, |_| {})
                        .await;
                    break files;
                }
            }
        };

        // DEPLOYMENT
        self.begin_stage(
            PipelineStage::Deployment,
            Some("sentry"),
            DEPLOYMENT_CREW,
            AgentStatus::Working,
            &format!("Deploying {} to preview", research.name),
        )
        .await;
        let url = guarded(cancel, self.deployer.deploy(&research.name, &files)).await?;
        self.complete_stage(
            DEPLOYMENT_CREW,
            &format!("Live at {}", url),
            LogLevel::Success,
            |state| state.aggregator.set_deployment_url(&url),
        )
        .await;

        Ok(())
    }

    /// Mark the crew busy, point the handoff at the lead, log the action.
    /// The project's stage moves only once the result is recorded.
    async fn begin_stage(
        &self,
        stage: PipelineStage,
        from: Option<&str>,
        crew: &[&str],
        status: AgentStatus,
        message: &str,
    ) {
        let lead = crew.first().copied().unwrap_or(COORDINATOR);
        let events = {
            let mut state = self.state.write().await;
            let mut events = Vec::with_capacity(crew.len() + 1);
            for id in crew {
                state.registry.update(id, status, Some(message));
                events.push(
                    SwarmEvent::new(SwarmEventKind::AgentStarted, id)
                        .with_data(json!({ "stage": stage, "status": status })),
                );
            }
            state.handoff = from.map(|from| Handoff {
                from: from.to_string(),
                to: lead.to_string(),
            });
            events.push(state.log(lead, message, LogLevel::Info));
            events
        };
        tracing::info!(?stage, "Stage started");
        self.publish(events).await;
    }

    /// Record the stage result and the stage itself, then mark the crew done
    /// and advance
    async fn complete_stage<F>(&self, crew: &[&str], message: &str, level: LogLevel, record: F)
    where
        F: FnOnce(&mut FactoryState),
    {
        let lead = crew.first().copied().unwrap_or(COORDINATOR);
        let events = {
            let mut state = self.state.write().await;
            record(&mut *state);
            let stage = state.pipeline.stage();
            if let Some(stage) = stage {
                state.aggregator.set_stage(stage);
            }

            let mut events = Vec::with_capacity(crew.len() + 2);
            for id in crew {
                state.registry.update(id, AgentStatus::Completed, Some(message));
                events.push(SwarmEvent::new(SwarmEventKind::AgentCompleted, id));
            }
            state.handoff = None;
            events.push(state.log(lead, message, level));

            if let Some(stage) = stage {
                tracing::info!(?stage, "Stage completed");
                events.push(
                    SwarmEvent::new(SwarmEventKind::StageCompleted, COORDINATOR)
                        .with_data(json!({ "stage": stage })),
                );
            }
            state.pipeline.advance();
            events
        };
        self.publish(events).await;
    }

    /// Record a failed audit. Returns whether the loop goes back to coding,
    /// and the audits performed so far.
    async fn reject_audit(&self, report: &AuditReport) -> (bool, u32) {
        let (retry, attempts, events) = {
            let mut state = self.state.write().await;
            let attempts = state.pipeline.record_audit();
            let max = state.pipeline.max_audit_attempts;
            state.aggregator.record_audit(report, attempts);
            let retry = state.pipeline.reject_audit();

            let mut events = vec![SwarmEvent::new(SwarmEventKind::AuditRejected, "sentry")
                .with_data(json!({ "attempt": attempts, "max": max, "notes": report.notes }))];
            events.push(state.log(
                "sentry",
                &format!("Audit failed ({}/{}): {}", attempts, max, report.notes),
                LogLevel::Warning,
            ));
            if retry {
                state
                    .registry
                    .update("sentry", AgentStatus::Idle, Some("Sent back to coding"));
            }
            (retry, attempts, events)
        };
        tracing::warn!(attempts, retry, notes = %report.notes, "Audit rejected");
        self.publish(events).await;
        (retry, attempts)
    }

    async fn finish(&self) -> RunOutcome {
        let events = {
            let mut state = self.state.write().await;
            state.aggregator.set_status(ProjectStatus::Completed);
            let url = state
                .aggregator
                .project()
                .and_then(|p| p.vercel_url.clone());
            let entry = state.aggregator.append_terminal_log(
                SYSTEM,
                "Factory run complete",
                LogLevel::Success,
            );
            vec![
                log_event(COORDINATOR, &entry),
                SwarmEvent::new(SwarmEventKind::PipelineCompleted, COORDINATOR)
                    .with_data(json!({ "url": url })),
            ]
        };
        tracing::info!("Factory run complete");
        self.publish(events).await;
        RunOutcome::Completed
    }

    async fn abort(&self, err: ForgeError) -> RunOutcome {
        let message = err.log_message();
        let (stage, events) = {
            let mut state = self.state.write().await;
            let failed = state.registry.fail_active();
            let stage = state.pipeline.fail();
            state.handoff = None;
            state.aggregator.set_status(ProjectStatus::Failed);
            let entry = state
                .aggregator
                .append_terminal_log(SYSTEM, &message, LogLevel::Error);

            let mut events: Vec<SwarmEvent> = failed
                .iter()
                .map(|id| SwarmEvent::new(SwarmEventKind::AgentFailed, id))
                .collect();
            events.push(log_event(COORDINATOR, &entry));
            events.push(
                SwarmEvent::new(SwarmEventKind::PipelineFailed, COORDINATOR)
                    .with_data(json!({ "stage": stage, "reason": message })),
            );
            (stage, events)
        };
        tracing::error!(?stage, error = %err, "Factory run failed");
        self.publish(events).await;

        match err {
            ForgeError::Cancelled => RunOutcome::Cancelled,
            other => RunOutcome::Failed {
                stage,
                reason: other.to_string(),
            },
        }
    }
}

fn non_empty_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}
