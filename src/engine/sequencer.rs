// src/engine/sequencer.rs

//! The step sequencer.
//!
//! [`Orchestrator::run`] executes an ordered list of steps for one target:
//! it publishes a state transition before each step, awaits the step's
//! action on its own task, and stops at the first failure or cancellation.
//! Background tickers started by actions publish through the same progress
//! hub, so every write to a target's state is serialized.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::context::{Cancellation, Context};
use crate::engine::step::Step;
use crate::errors::{BootError, Result};
use crate::facts::{FactRotator, FactTickerGuard, spawn_fact_ticker};
use crate::progress::{
    ProgressHandle, ProgressReporter, ProgressUpdate, TargetState, UpdateMessage, spawn_hub,
};
use crate::sink::{FactSink, LogSink};
use crate::types::format_elapsed;

/// Channels supplied by the consumer.
#[derive(Debug)]
pub struct OrchestratorChannels {
    pub updates: mpsc::Sender<UpdateMessage>,
    pub logs: Option<mpsc::Sender<String>>,
    pub facts: Option<mpsc::Sender<String>>,
}

impl OrchestratorChannels {
    pub fn new(updates: mpsc::Sender<UpdateMessage>) -> Self {
        Self {
            updates,
            logs: None,
            facts: None,
        }
    }

    pub fn with_logs(mut self, logs: mpsc::Sender<String>) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn with_facts(mut self, facts: mpsc::Sender<String>) -> Self {
        self.facts = Some(facts);
        self
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// How long a Completed/Failed snapshot may wait for channel space.
    pub terminal_send_timeout: Duration,
    /// Facts rotated on the fact channel while a run is in progress.
    pub facts: Vec<String>,
    pub fact_interval: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            terminal_send_timeout: Duration::from_secs(2),
            facts: Vec::new(),
            fact_interval: Duration::from_secs(8),
        }
    }
}

/// Owns the progress hub and runs step sequences against it.
///
/// Each instance has its own state; two orchestrators in one process never
/// see each other's targets.
pub struct Orchestrator {
    progress: ProgressHandle,
    hub: JoinHandle<()>,
    logs: LogSink,
    facts: FactSink,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Build an orchestrator and spawn its progress hub.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(channels: OrchestratorChannels, options: OrchestratorOptions) -> Self {
        let logs = LogSink::new(channels.logs);
        let facts = FactSink::new(channels.facts);
        let (progress, hub) = spawn_hub(
            channels.updates,
            logs.clone(),
            options.terminal_send_timeout,
        );
        Self {
            progress,
            hub,
            logs,
            facts,
            options,
        }
    }

    /// Execute `steps` for `target`, in order, failing fast.
    ///
    /// - Returns `BootError::Canceled` as soon as `ctx` is found canceled or
    ///   expired before a step starts, or when an action reports
    ///   cancellation.
    /// - Returns `BootError::StepFailed` wrapping the first action error.
    ///
    /// Reusing a target name keeps its existing state and history.
    pub async fn run(&self, ctx: &Context, target: &str, steps: &[Step]) -> Result<()> {
        let reporter = self.progress.reporter(target);
        let total = steps.len();

        reporter.ensure_initialized();
        info!(target_name = %target, steps = total, "starting installation");
        reporter.report(ProgressUpdate::installing(
            0.0,
            format!("Starting {target} installation"),
        ));
        self.logs.send_log(format!("[{target}] starting installation ({total} steps)"));

        let _facts = self.start_fact_ticker(ctx);

        for (idx, step) in steps.iter().enumerate() {
            let index = idx + 1;

            if let Some(reason) = ctx.err() {
                return Err(self.cancel_at(&reporter, step, reason));
            }

            let description = format!("Step {index}/{total}: {}", step.description);
            info!(
                target_name = %target,
                step = index,
                total,
                progress = step.target_progress,
                "{}",
                step.description
            );
            reporter.report(ProgressUpdate::step(step.target_progress, description.as_str()));
            self.logs.send_log(format!("[{target}] {description}"));

            let started = Instant::now();
            if let Err(err) = step.action.run(ctx.clone()).await {
                // Only a context that has actually ended turns into a cancel;
                // a stray `Cancellation` from a live step is an ordinary failure.
                if err.downcast_ref::<Cancellation>().is_some() {
                    if let Some(reason) = ctx.err() {
                        return Err(self.cancel_at(&reporter, step, reason));
                    }
                }

                error!(
                    target_name = %target,
                    step = index,
                    error = %format!("{err:#}"),
                    "step failed"
                );
                reporter.report(ProgressUpdate::failed(
                    step.target_progress,
                    format!("Step {index}/{total} failed: {} - {err:#}", step.description),
                    format!("{err:#}"),
                ));
                self.logs.send_log(format!(
                    "[{target}] step {index}/{total} failed: {err:#}"
                ));
                return Err(BootError::StepFailed {
                    index,
                    total,
                    description: step.description.clone(),
                    source: err,
                });
            }

            let elapsed = format_elapsed(started.elapsed());
            info!(target_name = %target, step = index, %elapsed, "step finished");
            self.logs.send_log(format!(
                "[{target}] {} finished in {elapsed}",
                step.description
            ));
        }

        info!(target_name = %target, "installation complete");
        reporter.report(ProgressUpdate::completed(format!(
            "{target} installation complete"
        )));
        self.logs.send_log(format!("[{target}] installation complete"));
        Ok(())
    }

    fn cancel_at(
        &self,
        reporter: &ProgressReporter,
        step: &Step,
        reason: Cancellation,
    ) -> BootError {
        warn!(
            target_name = %reporter.target(),
            step = %step.description,
            %reason,
            "installation canceled"
        );
        reporter.report(ProgressUpdate::failed(
            step.target_progress,
            format!("Installation canceled: {}", step.description),
            reason.to_string(),
        ));
        self.logs.send_log(format!(
            "[{}] installation canceled at: {}",
            reporter.target(),
            step.description
        ));
        BootError::Canceled(reason)
    }

    fn start_fact_ticker(&self, ctx: &Context) -> Option<FactTickerGuard> {
        if self.options.facts.is_empty() || !self.facts.is_configured() {
            return None;
        }
        Some(spawn_fact_ticker(
            FactRotator::new(self.options.facts.iter().cloned()),
            self.options.fact_interval,
            self.facts.clone(),
            ctx,
        ))
    }

    /// Current state of `target`, if it has been referenced.
    pub async fn state(&self, target: &str) -> Option<TargetState> {
        self.progress.state(target).await
    }

    /// The most recent snapshot published for `target`.
    pub async fn last_update(&self, target: &str) -> Option<UpdateMessage> {
        self.progress.last_update(target).await
    }

    /// A reporter for actions that publish their own progress.
    pub fn reporter(&self, target: &str) -> ProgressReporter {
        self.progress.reporter(target)
    }

    pub fn log_sink(&self) -> LogSink {
        self.logs.clone()
    }

    pub fn fact_sink(&self) -> FactSink {
        self.facts.clone()
    }

    /// Drop this orchestrator's handles and wait for the hub to drain.
    ///
    /// The hub only exits once every outstanding reporter has been dropped
    /// too, so drop steps that captured one before calling this.
    pub async fn shutdown(self) {
        let Self { progress, hub, .. } = self;
        drop(progress);
        if let Err(e) = hub.await {
            warn!(error = %e, "progress hub task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::step::action_fn;
    use crate::types::InstallStatus;

    fn orchestrator() -> (Orchestrator, mpsc::Receiver<UpdateMessage>) {
        let (tx, rx) = mpsc::channel(64);
        (
            Orchestrator::new(OrchestratorChannels::new(tx), OrchestratorOptions::default()),
            rx,
        )
    }

    #[tokio::test]
    async fn empty_step_list_completes() {
        let (orch, _rx) = orchestrator();
        orch.run(&Context::new(), "noop", &[]).await.unwrap();

        let state = orch.state("noop").await.unwrap();
        assert_eq!(state.status, InstallStatus::Completed);
        assert_eq!(state.progress, 1.0);
        assert!(state.step_history.is_empty());
    }

    #[tokio::test]
    async fn step_descriptions_are_numbered() {
        let (orch, _rx) = orchestrator();
        let steps = vec![
            Step::new("download", 0.2, action_fn(|_ctx| async { anyhow::Ok(()) })),
            Step::new("install", 0.6, action_fn(|_ctx| async { anyhow::Ok(()) })),
        ];
        orch.run(&Context::new(), "k3s", &steps).await.unwrap();

        let state = orch.state("k3s").await.unwrap();
        assert_eq!(
            state.step_history,
            vec!["Step 1/2: download", "Step 2/2: install"]
        );
        assert_eq!(state.description, "k3s installation complete");
    }

    #[tokio::test]
    async fn cancellation_error_from_ended_context_is_not_wrapped() {
        let (orch, _rx) = orchestrator();
        let steps = vec![Step::new(
            "wait for api",
            0.5,
            action_fn(|ctx: Context| async move {
                ctx.cancel();
                Err::<(), _>(anyhow::Error::from(Cancellation::Canceled))
            }),
        )];
        let err = orch.run(&Context::new(), "k3s", &steps).await.unwrap_err();

        assert!(matches!(err, BootError::Canceled(Cancellation::Canceled)));
        let state = orch.state("k3s").await.unwrap();
        assert_eq!(state.status, InstallStatus::Failed);
        assert_eq!(state.description, "Installation canceled: wait for api");
    }

    #[tokio::test]
    async fn cancellation_error_with_live_context_is_a_step_failure() {
        let (orch, _rx) = orchestrator();
        let steps = vec![Step::new(
            "wait for api",
            0.5,
            action_fn(|_ctx| async {
                Err::<(), _>(anyhow::Error::from(Cancellation::DeadlineExceeded))
            }),
        )];
        let err = orch.run(&Context::new(), "k3s", &steps).await.unwrap_err();

        match err {
            BootError::StepFailed { index, source, .. } => {
                assert_eq!(index, 1);
                assert_eq!(
                    source.downcast_ref::<Cancellation>(),
                    Some(&Cancellation::DeadlineExceeded)
                );
            }
            other => panic!("expected StepFailed, got {other:?}"),
        }
        let state = orch.state("k3s").await.unwrap();
        assert_eq!(state.status, InstallStatus::Failed);
        assert!(state.description.starts_with("Step 1/1 failed: wait for api"));
    }
}
