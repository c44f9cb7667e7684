//! Forge CLI
//!
//! Runs the software factory from the terminal, streaming the run log as
//! agents hand work to each other.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forge_core::agents::AgentRegistry;
use forge_core::config::{AuditExhaustionPolicy, FactorySettings, ForgeConfig};
use forge_core::service::{GeminiService, GenerativeService, ScriptedService};
use forge_core::skills::ArtifactClient;
use forge_core::state::{export_bundle, LogEntry, LogLevel};
use forge_core::swarm::{Coordinator, RunOutcome, SwarmEvent, SwarmEventKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "forge_core=info,forge=info";

#[derive(Parser)]
#[command(author, version, about = "Forge - simulated multi-agent software factory")]
struct Args {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the factory on a market descriptor
    Run {
        /// Market or domain to research (defaults to the configured market)
        market: Option<String>,
        /// Settings file
        #[arg(long, default_value = ".forge/config.json")]
        config: PathBuf,
        /// Write the production package here when the run completes
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Use canned replies instead of the Gemini API
        #[arg(long)]
        dry_run: bool,
        /// Audits allowed before the quality gate gives up
        #[arg(long)]
        max_audit_attempts: Option<u32>,
        /// What to do when the last audit still fails (halt | proceed)
        #[arg(long)]
        on_audit_exhausted: Option<AuditExhaustionPolicy>,
        /// Deadline for each external call
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// List the agent roster
    Agents,
}

struct RunOptions {
    market: Option<String>,
    config: PathBuf,
    export_dir: Option<PathBuf>,
    dry_run: bool,
    max_audit_attempts: Option<u32>,
    on_audit_exhausted: Option<AuditExhaustionPolicy>,
    timeout_secs: Option<u64>,
}

impl RunOptions {
    fn settings(&self) -> Result<FactorySettings> {
        let mut settings = FactorySettings::load_or_default(&self.config)
            .with_context(|| format!("loading settings from {}", self.config.display()))?;
        if let Some(attempts) = self.max_audit_attempts {
            settings.max_audit_attempts = attempts;
        }
        if let Some(policy) = self.on_audit_exhausted {
            settings.on_audit_exhausted = policy;
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = secs;
        }
        if let Some(market) = &self.market {
            settings.market = market.clone();
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn level_marker(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "ℹ️ ",
        LogLevel::Success => "✅",
        LogLevel::Warning => "⚠️ ",
        LogLevel::Error => "❌",
    }
}

async fn print_events(mut rx: mpsc::Receiver<SwarmEvent>) {
    while let Some(event) = rx.recv().await {
        match event.kind {
            SwarmEventKind::LogAppended => {
                let Some(data) = event.data else { continue };
                match serde_json::from_value::<LogEntry>(data) {
                    Ok(entry) => println!(
                        "{} {} {}: {}",
                        entry.display_time(),
                        level_marker(entry.level),
                        entry.agent_name,
                        entry.message
                    ),
                    Err(e) => tracing::debug!("Unreadable log event: {}", e),
                }
            }
            SwarmEventKind::RunRejected => eprintln!("A run is already in progress"),
            _ => tracing::debug!(kind = ?event.kind, agent = %event.agent, "Swarm event"),
        }
    }
}

async fn run_factory(options: RunOptions) -> Result<()> {
    let settings = options.settings()?;

    // Fail fast on a missing credential, before any stage runs
    let service: Arc<dyn GenerativeService> = if options.dry_run {
        tracing::info!("Dry run, using scripted replies");
        Arc::new(ScriptedService::demo())
    } else {
        let config = ForgeConfig::from_env(settings.clone())?;
        Arc::new(GeminiService::new(&config)?)
    };

    let (event_tx, event_rx) = mpsc::channel(256);
    let client = ArtifactClient::new(service, &settings);
    let coordinator = Coordinator::new(client, &settings).with_event_channel(event_tx);
    let printer = tokio::spawn(print_events(event_rx));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling run...");
            trigger.cancel();
        }
    });

    println!("🚀 Running factory on market: {}", settings.market);
    let report = coordinator.run(&settings.market, cancel).await;

    // Closes the event channel so the printer drains and exits
    drop(coordinator);
    let _ = printer.await;

    match report.outcome {
        RunOutcome::Completed => {}
        RunOutcome::Failed { stage, reason } => {
            anyhow::bail!("Run failed during {}: {}", stage.label(), reason)
        }
        RunOutcome::Cancelled => anyhow::bail!("Run cancelled"),
        RunOutcome::Rejected => anyhow::bail!("Another run is already in progress"),
    }

    let project = report
        .project
        .context("completed run produced no project record")?;
    println!();
    println!("✅ {} is live", project.name);
    if let Some(url) = &project.vercel_url {
        println!("   URL:   {}", url);
    }
    println!("   Files: {}", project.code_files.len());
    for file in &project.code_files {
        println!("     - {}", file.path);
    }

    if let Some(dir) = &options.export_dir {
        let path = export_bundle(&project, dir)
            .with_context(|| format!("exporting package to {}", dir.display()))?;
        println!("   Package: {}", path.display());
    }

    Ok(())
}

fn list_agents() {
    for agent in AgentRegistry::new().all() {
        println!(
            "{:<14} {:<13} {}",
            agent.name,
            agent.stage.label(),
            agent.role
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match args.command {
        CliCommand::Agents => {
            list_agents();
            Ok(())
        }
        CliCommand::Run {
            market,
            config,
            export_dir,
            dry_run,
            max_audit_attempts,
            on_audit_exhausted,
            timeout_secs,
        } => {
            run_factory(RunOptions {
                market,
                config,
                export_dir,
                dry_run,
                max_audit_attempts,
                on_audit_exhausted,
                timeout_secs,
            })
            .await
        }
    }
}
