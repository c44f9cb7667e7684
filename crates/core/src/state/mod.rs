//! # Project State
//!
//! The project record, its aggregator and the export bundle.

pub mod aggregator;
pub mod bundle;
pub mod project_state;

pub use aggregator::ProjectAggregator;
pub use bundle::{bundle_file_name, export_bundle, write_bundle};
pub use project_state::{slugify, Artifact, LogEntry, LogLevel, Project, ProjectStatus};
