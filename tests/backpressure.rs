mod common;

use std::time::Duration;

use clusterboot::InstallStatus;
use clusterboot::progress::ProgressUpdate;
use common::{TestResult, drain, orchestrator_with_logs};

#[tokio::test]
async fn flooding_a_full_channel_never_blocks() -> TestResult {
    let mut harness = orchestrator_with_logs(4, 256);
    let reporter = harness.orchestrator.reporter("flood");
    reporter.ensure_initialized();

    for i in 0..100 {
        reporter.report(ProgressUpdate::installing(i as f64 / 100.0, format!("tick {i}")));
    }

    // The query is answered after every flood update was applied.
    let state = reporter.state().await.ok_or("missing state")?;
    assert_eq!(state.description, "tick 99");
    assert_eq!(state.progress, 0.99);

    let buffered = drain(&mut harness.updates);
    assert_eq!(buffered.len(), 4);
    assert_eq!(buffered[0].description, "tick 0");

    let warnings = drain(&mut harness.logs);
    assert_eq!(warnings.len(), 96);
    assert!(warnings.iter().all(|w| w.contains("update channel full")));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn terminal_update_waits_then_falls_back_to_last_update() -> TestResult {
    let mut harness = orchestrator_with_logs(1, 16);
    let reporter = harness.orchestrator.reporter("edge");

    reporter.report(ProgressUpdate::installing(0.2, "filling"));
    reporter.report(ProgressUpdate::completed("done"));

    // Blocks in the hub for the terminal send timeout (2s, paused clock).
    let last = harness
        .orchestrator
        .last_update("edge")
        .await
        .ok_or("no snapshot")?;
    assert_eq!(last.status, InstallStatus::Completed);

    let buffered = drain(&mut harness.updates);
    assert_eq!(buffered.len(), 1);
    assert_eq!(buffered[0].description, "filling");

    let logs = drain(&mut harness.logs);
    assert!(logs.iter().any(|l| l.contains("could not deliver final completed")));
    Ok(())
}

#[tokio::test]
async fn terminal_update_delivered_once_space_frees() -> TestResult {
    let mut harness = orchestrator_with_logs(1, 16);
    let reporter = harness.orchestrator.reporter("edge");

    reporter.report(ProgressUpdate::installing(0.2, "filling"));
    reporter.report(ProgressUpdate::completed("done"));

    let first = harness.updates.recv().await.ok_or("closed")?;
    assert_eq!(first.description, "filling");
    let second = tokio::time::timeout(Duration::from_secs(1), harness.updates.recv())
        .await?
        .ok_or("closed")?;
    assert_eq!(second.status, InstallStatus::Completed);
    Ok(())
}
