//! # Artifact Client
//!
//! One request/response cycle per pipeline need. Each call returns parsed
//! domain objects or a typed error; nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use super::audit_skill::{self, AuditReport};
use super::coding_skill::{self, CodeBundle};
use super::planning_skill::{self, TechnicalPlan};
use super::research_skill::{self, ResearchResult};
use super::structured;
use crate::config::FactorySettings;
use crate::error::{ForgeError, Operation};
use crate::models::ModelSet;
use crate::service::GenerativeService;
use crate::state::Artifact;

#[derive(Clone)]
pub struct ArtifactClient {
    service: Arc<dyn GenerativeService>,
    models: ModelSet,
    timeout: Duration,
    expected_file_count: usize,
}

impl ArtifactClient {
    pub fn new(service: Arc<dyn GenerativeService>, settings: &FactorySettings) -> Self {
        Self {
            service,
            models: settings.models.clone(),
            timeout: settings.request_timeout(),
            expected_file_count: settings.expected_file_count,
        }
    }

    pub async fn perform_research(&self, market: &str) -> Result<ResearchResult, ForgeError> {
        structured::request(
            self.service.as_ref(),
            Operation::Research,
            &self.models.research,
            research_skill::prompt(market),
            self.timeout,
        )
        .await
    }

    pub async fn generate_technical_plan(
        &self,
        research: &ResearchResult,
    ) -> Result<TechnicalPlan, ForgeError> {
        structured::request(
            self.service.as_ref(),
            Operation::TechnicalPlan,
            &self.models.planning,
            planning_skill::prompt(research),
            self.timeout,
        )
        .await
    }

    /// Generate the artifact set. `feedback` carries audit notes from a
    /// rejected previous attempt.
    pub async fn generate_code(
        &self,
        research: &ResearchResult,
        plan: &TechnicalPlan,
        feedback: Option<&str>,
    ) -> Result<Vec<Artifact>, ForgeError> {
        let bundle: CodeBundle = structured::request(
            self.service.as_ref(),
            Operation::CodeGeneration,
            &self.models.coding,
            coding_skill::prompt(research, plan, feedback, self.expected_file_count),
            self.timeout,
        )
        .await?;

        if bundle.files.len() < self.expected_file_count {
            tracing::warn!(
                produced = bundle.files.len(),
                expected = self.expected_file_count,
                "Code generation produced fewer files than targeted"
            );
        }
        Ok(bundle.files)
    }

    pub async fn audit_code(&self, files: &[Artifact]) -> Result<AuditReport, ForgeError> {
        structured::request(
            self.service.as_ref(),
            Operation::Audit,
            &self.models.audit,
            audit_skill::prompt(files),
            self.timeout,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{ScriptedReply, ScriptedService};
    use serde_json::json;

    fn client(service: ScriptedService) -> (Arc<ScriptedService>, ArtifactClient) {
        let service = Arc::new(service);
        let client = ArtifactClient::new(service.clone(), &FactorySettings::default());
        (service, client)
    }

    #[tokio::test]
    async fn test_research_missing_field_fails_closed() {
        let (_, client) = client(ScriptedService::new().respond(
            Operation::Research,
            json!({
                "name": "Aurora",
                "concept": "c",
                "solutions": ["s1"],
                "presentation": "x",
                "features": ["f1"]
            }),
        ));

        let err = client.perform_research("Pets").await.unwrap_err();
        match err {
            ForgeError::SchemaViolation { operation, detail } => {
                assert_eq!(operation, Operation::Research);
                assert!(detail.contains("painPoints"));
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_service_failure_names_operation() {
        let (_, client) = client(ScriptedService::new().reply(
            Operation::TechnicalPlan,
            ScriptedReply::Failure("connection reset".to_string()),
        ));
        let research = ResearchResult {
            name: "Aurora".to_string(),
            concept: "c".to_string(),
            pain_points: vec![],
            solutions: vec![],
            presentation: "x".to_string(),
            features: vec![],
        };

        let err = client.generate_technical_plan(&research).await.unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Service {
                operation: Operation::TechnicalPlan,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_code_below_soft_target_succeeds() {
        let (service, client) = client(ScriptedService::new().respond(
            Operation::CodeGeneration,
            json!({"files": [{"path": "App.tsx", "content": "x"}]}),
        ));
        let research = ResearchResult {
            name: "Aurora".to_string(),
            concept: "c".to_string(),
            pain_points: vec![],
            solutions: vec![],
            presentation: "x".to_string(),
            features: vec![],
        };
        let plan = TechnicalPlan {
            prd: "p".to_string(),
            context: "c".to_string(),
            sitemap: "s".to_string(),
            db_schema: "d".to_string(),
        };

        // Fewer than the soft target is still a success
        let files = client.generate_code(&research, &plan, None).await.unwrap();
        assert_eq!(files, vec![Artifact::new("App.tsx", "x")]);
        assert_eq!(service.calls(Operation::CodeGeneration), 1);
    }

    #[tokio::test]
    async fn test_audit_round_trip() {
        let (service, client) = client(ScriptedService::new().respond(
            Operation::Audit,
            json!({"status": "Fail", "notes": "README.md missing"}),
        ));
        let report = client
            .audit_code(&[Artifact::new("App.tsx", "x")])
            .await
            .unwrap();
        assert!(!report.passed());
        assert_eq!(report.notes, "README.md missing");
        assert!(service.prompts(Operation::Audit)[0].contains("App.tsx"));
    }
}
