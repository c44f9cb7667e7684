//! # Forge Skills
//!
//! Structured generative calls, one per pipeline need.
//!
//! ## Architecture
//!
//! ```text
//! ArtifactClient
//!   └── structured::request::<T>   (schema from T, timeout, decode, validate)
//!         └── GenerativeService     (Gemini, or scripted replies)
//! ```
//!
//! ## Skills
//!
//! - `research_skill` - Market scan → `ResearchResult`
//! - `planning_skill` - PRD, context, sitemap, schema → `TechnicalPlan`
//! - `coding_skill` - Source and documents → `CodeBundle`
//! - `audit_skill` - Structural audit → `AuditReport`

pub mod client;
pub mod prompts;
pub mod structured;

pub mod audit_skill;
pub mod coding_skill;
pub mod planning_skill;
pub mod research_skill;

pub use audit_skill::{AuditReport, AuditVerdict};
pub use client::ArtifactClient;
pub use coding_skill::CodeBundle;
pub use planning_skill::TechnicalPlan;
pub use research_skill::ResearchResult;
pub use structured::StructuredOutput;
