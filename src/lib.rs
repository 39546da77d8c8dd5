// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod facts;
pub mod logging;
pub mod progress;
pub mod render;
pub mod sink;
pub mod ticker;
pub mod types;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{PlanFile, TargetPlan, load_and_validate};
use crate::context::Context;
use crate::engine::{Orchestrator, OrchestratorChannels, OrchestratorOptions};
use crate::exec::steps_for_target;
use crate::progress::UpdateMessage;
use crate::render::{RenderMode, spawn_console_renderer};

pub use crate::context::Cancellation;
pub use crate::errors::BootError;
pub use crate::types::InstallStatus;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading
/// - the orchestrator and its progress hub
/// - the console renderer
/// - Ctrl-C handling and the plan-wide timeout
pub async fn run(args: CliArgs) -> Result<()> {
    let plan_path = PathBuf::from(&args.plan);
    let plan = load_and_validate(&plan_path)?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let targets = selected_targets(&plan, args.target.as_deref())?;

    let settings = &plan.orchestrator;
    let (update_tx, update_rx) = mpsc::channel::<UpdateMessage>(settings.update_buffer);
    let (log_tx, log_rx) = mpsc::channel::<String>(settings.log_buffer);
    let mut channels = OrchestratorChannels::new(update_tx).with_logs(log_tx);

    let fact_rx = if plan.facts.items.is_empty() {
        None
    } else {
        let (fact_tx, fact_rx) = mpsc::channel::<String>(4);
        channels = channels.with_facts(fact_tx);
        Some(fact_rx)
    };

    let mode = if args.json {
        RenderMode::Json
    } else {
        RenderMode::Text
    };
    let renderer = spawn_console_renderer(update_rx, Some(log_rx), fact_rx, mode);

    let root = Context::new();
    let ctx = match settings.timeout {
        Some(timeout) => root.with_timeout(timeout),
        None => root.clone(),
    };

    // Ctrl-C → cancel whatever step is running.
    let ctrl_c = {
        let root = root.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received, canceling installation");
            root.cancel();
        })
    };

    let options = OrchestratorOptions {
        terminal_send_timeout: settings.terminal_send_timeout,
        facts: plan.facts.items.clone(),
        fact_interval: plan.facts.interval,
    };
    let orchestrator = Orchestrator::new(channels, options);

    let mut outcome = Ok(());
    for target in targets {
        let steps = steps_for_target(target, &orchestrator);
        let result = orchestrator.run(&ctx, &target.name, &steps).await;
        drop(steps);

        if let Err(err) = result {
            outcome = Err(anyhow::Error::from(err).context(format!("installing {}", target.name)));
            break;
        }
    }

    orchestrator.shutdown().await;
    ctrl_c.abort();
    if let Err(e) = renderer.await {
        warn!(error = %e, "renderer task ended abnormally");
    }

    outcome
}

/// Targets to run, in plan order.
fn selected_targets<'a>(plan: &'a PlanFile, only: Option<&str>) -> Result<Vec<&'a TargetPlan>> {
    match only {
        Some(name) => plan
            .target(name)
            .map(|t| vec![t])
            .ok_or_else(|| anyhow!("target `{name}` is not defined in the plan")),
        None => Ok(plan.targets.iter().collect()),
    }
}

/// Simple dry-run output: print targets, steps and commands.
fn print_dry_run(plan: &PlanFile) {
    println!("clusterboot dry-run");
    println!(
        "  orchestrator.update_buffer = {}",
        plan.orchestrator.update_buffer
    );
    println!(
        "  orchestrator.terminal_send_timeout = {:?}",
        plan.orchestrator.terminal_send_timeout
    );
    if let Some(timeout) = plan.orchestrator.timeout {
        println!("  orchestrator.timeout = {timeout:?}");
    }
    println!(
        "  facts = {} (every {:?})",
        plan.facts.items.len(),
        plan.facts.interval
    );
    println!();

    println!("targets ({}):", plan.targets.len());
    for target in &plan.targets {
        println!("  - {}", target.name);
        let total = target.steps.len();
        for (idx, step) in target.steps.iter().enumerate() {
            println!(
                "      {}/{} [{:>3.0}%] {}",
                idx + 1,
                total,
                step.progress * 100.0,
                step.description
            );
            println!("          cmd: {}", step.cmd);
            if let Some(interval) = step.interpolate {
                println!("          interpolate: {interval:?}");
            }
            if let Some(timeout) = step.timeout {
                println!("          timeout: {timeout:?}");
            }
            if let Some(classifier) = &step.classifier {
                println!("          patterns: {}", classifier.len());
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
