pub mod builders;
pub mod fake_action;

use std::sync::Once;

use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

use clusterboot::engine::{Orchestrator, OrchestratorChannels, OrchestratorOptions};
use clusterboot::progress::UpdateMessage;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Receivers paired with an orchestrator built by [`orchestrator_with_logs`].
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub updates: mpsc::Receiver<UpdateMessage>,
    pub logs: mpsc::Receiver<String>,
}

/// Orchestrator with an update channel of `capacity` and no log channel.
pub fn orchestrator(capacity: usize) -> (Orchestrator, mpsc::Receiver<UpdateMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    let orch = Orchestrator::new(
        OrchestratorChannels::new(tx),
        OrchestratorOptions::default(),
    );
    (orch, rx)
}

/// Orchestrator wired to both an update channel and a log channel.
pub fn orchestrator_with_logs(update_capacity: usize, log_capacity: usize) -> Harness {
    let (tx, updates) = mpsc::channel(update_capacity);
    let (log_tx, logs) = mpsc::channel(log_capacity);
    let orchestrator = Orchestrator::new(
        OrchestratorChannels::new(tx).with_logs(log_tx),
        OrchestratorOptions::default(),
    );
    Harness {
        orchestrator,
        updates,
        logs,
    }
}

/// Drain everything currently buffered in a receiver.
pub fn drain<T>(rx: &mut mpsc::Receiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}
