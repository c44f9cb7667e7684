//! # Agent Registry
//!
//! The fixed roster of factory agents. Agents differ only in data: each one
//! is tagged with the pipeline stage it works on and carries a status that
//! the coordinator drives.

use serde::{Deserialize, Serialize};

use crate::swarm::PipelineStage;

/// Status of an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    #[default]
    Idle,
    /// Analysis-heavy work in flight
    Thinking,
    Working,
    Completed,
    Error,
}

impl AgentStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AgentStatus::Thinking | AgentStatus::Working)
    }
}

/// Static identity of a roster member
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    pub description: &'static str,
    pub stage: PipelineStage,
}

pub const ROSTER: [AgentProfile; 9] = [
    AgentProfile {
        id: "echo",
        name: "Agent Echo",
        role: "Viral Niche Algorithmic Scout",
        description: "Scans the market for underserved niches and viral growth openings.",
        stage: PipelineStage::Research,
    },
    AgentProfile {
        id: "analyst",
        name: "Agent Analyst",
        role: "Behavioral Data Modeler",
        description: "Models user behaviour to estimate which ideas can spread.",
        stage: PipelineStage::Research,
    },
    AgentProfile {
        id: "blueprint",
        name: "Agent Blueprint",
        role: "Product Requirements Planner",
        description: "Turns research into a PRD, technical context, sitemap and data schema.",
        stage: PipelineStage::Planning,
    },
    AgentProfile {
        id: "nexus",
        name: "Agent Nexus",
        role: "Engagement Logic & Schema Strategist",
        description: "Shapes the social graph and data model around retention.",
        stage: PipelineStage::Architecture,
    },
    AgentProfile {
        id: "growth",
        name: "Agent Growth",
        role: "Viral Loop Architect",
        description: "Designs invitation and sharing loops for network effects.",
        stage: PipelineStage::Architecture,
    },
    AgentProfile {
        id: "forge",
        name: "Agent Forge",
        role: "Rapid Social Interface Engineer",
        description: "Builds the application source.",
        stage: PipelineStage::Coding,
    },
    AgentProfile {
        id: "scribe",
        name: "Agent Scribe",
        role: "Documentation & Pitch Specialist",
        description: "Writes the README, planning documents and pitch deck.",
        stage: PipelineStage::Coding,
    },
    AgentProfile {
        id: "sentry",
        name: "Agent Sentry",
        role: "Trust, Safety & Security Auditor",
        description: "Audits the produced artifact set before anything ships.",
        stage: PipelineStage::Qa,
    },
    AgentProfile {
        id: "orbit",
        name: "Agent Orbit",
        role: "Multi-Cloud Social Scaling Engine",
        description: "Publishes the deliverable to a preview deployment.",
        stage: PipelineStage::Deployment,
    },
];

/// A roster member with its live status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    pub description: String,
    pub stage: PipelineStage,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

impl From<&AgentProfile> for Agent {
    fn from(profile: &AgentProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name.to_string(),
            role: profile.role.to_string(),
            description: profile.description.to_string(),
            stage: profile.stage,
            status: AgentStatus::Idle,
            last_message: None,
        }
    }
}

/// Flat list of agents, created once and mutated in place
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: ROSTER.iter().map(Agent::from).collect(),
        }
    }

    pub fn all(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn by_stage(&self, stage: PipelineStage) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(move |a| a.stage == stage)
    }

    /// Set status and, when given, the last message. Returns false for
    /// unknown ids.
    pub fn update(&mut self, id: &str, status: AgentStatus, message: Option<&str>) -> bool {
        match self.agents.iter_mut().find(|a| a.id == id) {
            Some(agent) => {
                agent.status = status;
                if let Some(message) = message {
                    agent.last_message = Some(message.to_string());
                }
                true
            }
            None => false,
        }
    }

    /// Mark every in-flight agent as errored; returns their ids
    pub fn fail_active(&mut self) -> Vec<String> {
        self.agents
            .iter_mut()
            .filter(|a| a.status.is_active())
            .map(|a| {
                a.status = AgentStatus::Error;
                a.id.clone()
            })
            .collect()
    }

    /// Back to IDLE for a fresh run
    pub fn reset(&mut self) {
        for agent in &mut self.agents {
            agent.status = AgentStatus::Idle;
            agent.last_message = None;
        }
    }

    pub fn all_completed(&self) -> bool {
        self.agents
            .iter()
            .all(|a| a.status == AgentStatus::Completed)
    }

    pub fn name_of(&self, id: &str) -> String {
        self.get(id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
