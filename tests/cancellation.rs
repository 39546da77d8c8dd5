mod common;

use std::time::Duration;

use clusterboot::context::{Cancellation, Context};
use clusterboot::engine::Step;
use clusterboot::{BootError, InstallStatus};
use common::{
    BlockingAction, CancelContextAction, SpyAction, TestResult, orchestrator, with_timeout,
};

#[tokio::test]
async fn cancel_between_steps_stops_before_next() -> TestResult {
    let (orch, _rx) = orchestrator(64);
    let first = SpyAction::new();
    let third = SpyAction::new();
    let steps = vec![
        Step::new("download", 0.1, first.clone()),
        Step::new("trip the switch", 0.4, CancelContextAction),
        Step::new("install", 0.7, third.clone()),
    ];

    let err = with_timeout(orch.run(&Context::new(), "k3s", &steps))
        .await
        .unwrap_err();

    assert!(matches!(err, BootError::Canceled(Cancellation::Canceled)));
    assert!(err.is_cancellation());
    assert_eq!(first.calls(), 1);
    assert_eq!(third.calls(), 0);

    let state = orch.state("k3s").await.ok_or("missing state")?;
    assert_eq!(state.status, InstallStatus::Failed);
    assert_eq!(state.progress, 0.7);
    assert_eq!(state.description, "Installation canceled: install");
    assert_eq!(state.error.as_deref(), Some("context canceled"));
    assert_eq!(
        state.step_history,
        vec!["Step 1/3: download", "Step 2/3: trip the switch"]
    );
    Ok(())
}

#[tokio::test]
async fn pre_canceled_context_runs_nothing() -> TestResult {
    let (orch, _rx) = orchestrator(64);
    let spy = SpyAction::new();
    let steps = vec![Step::new("first", 0.2, spy.clone())];

    let ctx = Context::new();
    ctx.cancel();
    let err = orch.run(&ctx, "argo", &steps).await.unwrap_err();

    assert!(err.is_cancellation());
    assert_eq!(spy.calls(), 0);
    let state = orch.state("argo").await.ok_or("missing state")?;
    assert_eq!(state.description, "Installation canceled: first");
    assert!(state.step_history.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deadline_interrupts_a_blocking_step() -> TestResult {
    let (orch, _rx) = orchestrator(64);
    let blocking = BlockingAction::new();
    let after = SpyAction::new();
    let steps = vec![
        Step::new("wait for api server", 0.3, blocking.clone()),
        Step::new("apply manifests", 0.8, after.clone()),
    ];

    let ctx = Context::new().with_timeout(Duration::from_secs(30));
    let err = orch.run(&ctx, "k3s", &steps).await.unwrap_err();

    assert!(matches!(err, BootError::Canceled(Cancellation::DeadlineExceeded)));
    assert_eq!(blocking.started(), 1);
    assert_eq!(after.calls(), 0);

    let state = orch.state("k3s").await.ok_or("missing state")?;
    assert_eq!(state.status, InstallStatus::Failed);
    assert_eq!(state.description, "Installation canceled: wait for api server");
    assert_eq!(state.error.as_deref(), Some("context deadline exceeded"));
    Ok(())
}

#[tokio::test]
async fn external_cancel_reaches_running_action() -> TestResult {
    let (orch, _rx) = orchestrator(64);
    let blocking = BlockingAction::new();
    let steps = vec![Step::new("long haul", 0.5, blocking.clone())];

    let ctx = Context::new();
    let canceller = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            ctx.cancel();
        })
    };

    let err = with_timeout(orch.run(&ctx, "ceph", &steps))
        .await
        .unwrap_err();
    canceller.await?;

    assert!(matches!(err, BootError::Canceled(Cancellation::Canceled)));
    Ok(())
}
