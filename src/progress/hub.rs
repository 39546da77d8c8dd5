// src/progress/hub.rs

//! Single-writer progress actor.
//!
//! All state mutations, whether from the sequencer or from background
//! tickers, are sent as [`HubCommand`]s over one unbounded channel to a
//! single Tokio task. That task owns the [`ProgressBook`] exclusively and
//! performs the fan-out publish to the consumer's update channel.
//!
//! - Sending a mutation never blocks the writer.
//! - Commands from one writer are applied in send order.
//! - Queries are answered in queue order, so they observe every mutation
//!   the same writer sent before them.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::progress::book::ProgressBook;
use crate::progress::state::{ProgressUpdate, TargetState, UpdateMessage};
use crate::sink::LogSink;

/// Messages accepted by the hub task.
#[derive(Debug)]
pub enum HubCommand {
    Ensure {
        target: String,
    },
    Log {
        target: String,
        update: ProgressUpdate,
    },
    State {
        target: String,
        reply: oneshot::Sender<Option<TargetState>>,
    },
    LastUpdate {
        target: String,
        reply: oneshot::Sender<Option<UpdateMessage>>,
    },
}

/// The actor itself. Construct via [`spawn_hub`].
pub struct ProgressHub {
    book: ProgressBook,
    updates: mpsc::Sender<UpdateMessage>,
    logs: LogSink,
    terminal_send_timeout: Duration,
}

impl ProgressHub {
    pub fn new(
        updates: mpsc::Sender<UpdateMessage>,
        logs: LogSink,
        terminal_send_timeout: Duration,
    ) -> Self {
        Self {
            book: ProgressBook::new(),
            updates,
            logs,
            terminal_send_timeout,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<HubCommand>) {
        debug!("progress hub started");

        while let Some(command) = commands.recv().await {
            self.handle(command).await;
        }

        info!("progress hub finished (all handles dropped)");
    }

    async fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Ensure { target } => {
                self.book.ensure_initialized(&target);
            }
            HubCommand::Log { target, update } => {
                let snapshot = self.book.log_progress(&target, update, Utc::now());
                self.publish(snapshot).await;
            }
            HubCommand::State { target, reply } => {
                let _ = reply.send(self.book.state(&target));
            }
            HubCommand::LastUpdate { target, reply } => {
                let _ = reply.send(self.book.last_update(&target));
            }
        }
    }

    /// Deliver a snapshot to the consumer.
    ///
    /// Intermediate updates are sent with `try_send` and dropped when the
    /// buffer is full. Terminal updates wait up to `terminal_send_timeout`
    /// for buffer space before being dropped.
    async fn publish(&self, snapshot: UpdateMessage) {
        if snapshot.status.is_terminal() {
            self.publish_terminal(snapshot).await;
            return;
        }

        match self.updates.try_send(snapshot) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    target_name = %dropped.target,
                    sequence = dropped.sequence,
                    "update channel full; dropping progress update"
                );
                self.logs.send_log(format!(
                    "warning: update channel full, dropped update #{} for {}",
                    dropped.sequence, dropped.target
                ));
            }
            Err(TrySendError::Closed(dropped)) => {
                debug!(
                    target_name = %dropped.target,
                    "update channel closed; consumer has gone away"
                );
            }
        }
    }

    async fn publish_terminal(&self, snapshot: UpdateMessage) {
        let target = snapshot.target.clone();
        let status = snapshot.status;

        match tokio::time::timeout(self.terminal_send_timeout, self.updates.send(snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(_closed)) => {
                debug!(target_name = %target, "update channel closed before terminal update");
            }
            Err(_elapsed) => {
                warn!(
                    target_name = %target,
                    %status,
                    timeout = ?self.terminal_send_timeout,
                    "update channel stayed full; dropping terminal update"
                );
                self.logs.send_log(format!(
                    "warning: could not deliver final {status} state for {target}"
                ));
            }
        }
    }
}

/// Spawn the hub task and return a handle to it.
///
/// Must be called from within a Tokio runtime. The task exits once every
/// [`ProgressHandle`] (and every [`ProgressReporter`]) has been dropped.
pub fn spawn_hub(
    updates: mpsc::Sender<UpdateMessage>,
    logs: LogSink,
    terminal_send_timeout: Duration,
) -> (ProgressHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let hub = ProgressHub::new(updates, logs, terminal_send_timeout);
    let join = tokio::spawn(hub.run(rx));
    (ProgressHandle { tx }, join)
}

/// Cloneable entry point to the hub.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl ProgressHandle {
    pub fn ensure_initialized(&self, target: &str) {
        self.send(HubCommand::Ensure {
            target: target.to_string(),
        });
    }

    /// The single mutation entrypoint for every writer.
    pub fn log_progress(&self, target: &str, update: ProgressUpdate) {
        self.send(HubCommand::Log {
            target: target.to_string(),
            update,
        });
    }

    pub async fn state(&self, target: &str) -> Option<TargetState> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::State {
            target: target.to_string(),
            reply,
        });
        rx.await.ok().flatten()
    }

    pub async fn last_update(&self, target: &str) -> Option<UpdateMessage> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::LastUpdate {
            target: target.to_string(),
            reply,
        });
        rx.await.ok().flatten()
    }

    /// A handle bound to one target, for background tasks.
    pub fn reporter(&self, target: &str) -> ProgressReporter {
        ProgressReporter {
            handle: self.clone(),
            target: target.to_string(),
        }
    }

    fn send(&self, command: HubCommand) {
        if self.tx.send(command).is_err() {
            debug!("progress hub has shut down; dropping command");
        }
    }
}

/// A [`ProgressHandle`] pinned to a single target.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    handle: ProgressHandle,
    target: String,
}

impl ProgressReporter {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn ensure_initialized(&self) {
        self.handle.ensure_initialized(&self.target);
    }

    pub fn report(&self, update: ProgressUpdate) {
        self.handle.log_progress(&self.target, update);
    }

    pub async fn state(&self) -> Option<TargetState> {
        self.handle.state(&self.target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallStatus;

    #[tokio::test]
    async fn queries_observe_prior_mutations() {
        let (tx, mut rx) = mpsc::channel(8);
        let (handle, _join) = spawn_hub(tx, LogSink::disabled(), Duration::from_millis(50));

        handle.log_progress("k3s", ProgressUpdate::step(0.2, "Step 1/2: a"));
        handle.log_progress("k3s", ProgressUpdate::step(0.6, "Step 2/2: b"));

        let state = handle.state("k3s").await.unwrap();
        assert_eq!(state.progress, 0.6);
        assert_eq!(state.step_history.len(), 2);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.progress, 0.2);
        assert_eq!(first.step_history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_target_has_no_state() {
        let (tx, _rx) = mpsc::channel(1);
        let (handle, _join) = spawn_hub(tx, LogSink::disabled(), Duration::from_millis(50));
        assert!(handle.state("nope").await.is_none());
        assert!(handle.last_update("nope").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_update_waits_for_space() {
        let (tx, mut rx) = mpsc::channel(1);
        let (handle, _join) = spawn_hub(tx, LogSink::disabled(), Duration::from_secs(5));

        handle.log_progress("k3s", ProgressUpdate::step(0.5, "Step 1/1: a"));
        handle.log_progress("k3s", ProgressUpdate::completed("done"));

        // Drain after a delay shorter than the terminal timeout.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.recv().await.unwrap().status, InstallStatus::Installing);
        assert_eq!(rx.recv().await.unwrap().status, InstallStatus::Completed);
    }

    #[tokio::test]
    async fn hub_exits_when_handles_drop() {
        let (tx, _rx) = mpsc::channel(1);
        let (handle, join) = spawn_hub(tx, LogSink::disabled(), Duration::from_millis(10));
        let reporter = handle.reporter("x");
        drop(handle);
        reporter.report(ProgressUpdate::installing(0.1, "still alive"));
        drop(reporter);
        join.await.unwrap();
    }
}
