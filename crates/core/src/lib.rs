//! # Forge Core
//!
//! The simulated software factory: a fixed roster of agents carries a market
//! descriptor through research, planning, architecture, a bounded
//! coding/audit loop and a preview deployment.
//!
//! ## Architecture
//!
//! - `service/` - Generative service boundary (Gemini, scripted) and deployment targets
//! - `skills/` - Structured requests for the four generative operations
//! - `agents` - Agent roster and live status
//! - `state/` - Project record, log aggregation, export bundle
//! - `swarm/` - Pipeline state machine and coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forge_core::config::{FactorySettings, ForgeConfig};
//! use forge_core::service::GeminiService;
//! use forge_core::skills::ArtifactClient;
//! use forge_core::swarm::Coordinator;
//!
//! let config = ForgeConfig::from_env(FactorySettings::default())?;
//! let service = Arc::new(GeminiService::new(&config)?);
//! let client = ArtifactClient::new(service, &config.settings);
//! let coordinator = Coordinator::new(client, &config.settings);
//! let report = coordinator.run("Pet Care", CancellationToken::new()).await;
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod skills;
pub mod state;
pub mod swarm;

pub use error::{ForgeError, Operation};
