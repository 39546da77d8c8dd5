// src/ticker.rs

//! Ownership of a background ticking task.
//!
//! A [`TickerGuard`] holds the task's "done" token. The token is cancelled
//! exactly once: on [`TickerGuard::stop`], or on `Drop` if the owner returns
//! early through `?` or a panic unwinds. Either way the task cannot keep
//! publishing after its owner has returned.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::Context;

#[derive(Debug)]
pub struct TickerGuard {
    done: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TickerGuard {
    /// Spawn `body` with a done token derived from `ctx`.
    ///
    /// Cancelling `ctx` also cancels the token, so `body` only has to watch
    /// the token and the context deadline.
    pub fn spawn<F, Fut>(ctx: &Context, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let done = ctx.token().child_token();
        let handle = tokio::spawn(body(done.clone()));
        Self {
            done,
            handle: Some(handle),
        }
    }

    /// A guard with nothing behind it.
    pub fn inert() -> Self {
        Self {
            done: CancellationToken::new(),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task and wait for it to finish.
    pub async fn stop(mut self) {
        self.done.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        self.done.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn stop_waits_for_task() {
        let exited = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&exited);
        let guard = TickerGuard::spawn(&Context::new(), move |done| async move {
            done.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        assert!(guard.is_running());
        guard.stop().await;
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn context_cancel_reaches_task() {
        let ctx = Context::new();
        let guard = TickerGuard::spawn(&ctx, |done| async move {
            done.cancelled().await;
        });
        ctx.cancel();
        guard.stop().await;
    }

    #[test]
    fn inert_guard_is_not_running() {
        assert!(!TickerGuard::inert().is_running());
    }
}
