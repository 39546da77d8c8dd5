use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use clusterboot::context::Context;
use clusterboot::engine::{Action, ActionFuture};

/// Error returned by [`FailingAction`], so tests can downcast the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ErrX")]
pub struct ErrX;

/// Succeeds and counts how many times it ran.
#[derive(Debug, Clone, Default)]
pub struct SpyAction {
    calls: Arc<AtomicUsize>,
}

impl SpyAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Action for SpyAction {
    fn run(&self, _ctx: Context) -> ActionFuture<'_> {
        let calls = Arc::clone(&self.calls);
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Always fails with [`ErrX`], counting attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingAction {
    calls: Arc<AtomicUsize>,
}

impl FailingAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Action for FailingAction {
    fn run(&self, _ctx: Context) -> ActionFuture<'_> {
        let calls = Arc::clone(&self.calls);
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ErrX.into())
        })
    }
}

/// Cancels the context it receives, then succeeds.
#[derive(Debug, Clone, Default)]
pub struct CancelContextAction;

impl Action for CancelContextAction {
    fn run(&self, ctx: Context) -> ActionFuture<'_> {
        Box::pin(async move {
            ctx.cancel();
            Ok(())
        })
    }
}

/// Blocks until its context ends and reports why.
#[derive(Debug, Clone, Default)]
pub struct BlockingAction {
    started: Arc<AtomicUsize>,
}

impl BlockingAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

impl Action for BlockingAction {
    fn run(&self, ctx: Context) -> ActionFuture<'_> {
        let started = Arc::clone(&self.started);
        Box::pin(async move {
            started.fetch_add(1, Ordering::SeqCst);
            let reason = ctx.done().await;
            Err(reason.into())
        })
    }
}
