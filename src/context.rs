// src/context.rs

//! Cancellation context threaded through a run.
//!
//! A [`Context`] combines a [`CancellationToken`] with an optional deadline.
//! The sequencer checks it before starting each step, and every action and
//! background ticker receives a clone of it. Deriving a context with
//! [`Context::with_timeout`] or [`Context::child`] creates a child token:
//! cancelling the child never cancels the parent, but cancelling the parent
//! reaches every child.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Cancellation {
    #[error("context canceled")]
    Canceled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a child context that additionally expires after `timeout`.
    ///
    /// The effective deadline is the earlier of the parent's and the new one.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context with the same deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and everything derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Some(reason)` once the context is canceled or expired.
    ///
    /// Explicit cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<Cancellation> {
        if self.token.is_cancelled() {
            return Some(Cancellation::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cancellation::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is canceled or its deadline passes.
    pub async fn done(&self) -> Cancellation {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => Cancellation::Canceled,
                    _ = tokio::time::sleep_until(deadline) => {
                        self.err().unwrap_or(Cancellation::DeadlineExceeded)
                    }
                }
            }
            None => {
                self.token.cancelled().await;
                Cancellation::Canceled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_live() {
        let ctx = Context::new();
        assert_eq!(ctx.err(), None);
        assert!(!ctx.is_done());
    }

    #[test]
    fn cancelling_parent_reaches_child_but_not_reverse() {
        let parent = Context::new();
        let child = parent.child();
        child.cancel();
        assert_eq!(child.err(), Some(Cancellation::Canceled));
        assert_eq!(parent.err(), None);

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.err(), Some(Cancellation::Canceled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let ctx = Context::new().with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.done().await, Cancellation::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(Cancellation::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn nested_timeout_keeps_earlier_deadline() {
        let outer = Context::new().with_timeout(Duration::from_secs(1));
        let inner = outer.with_timeout(Duration::from_secs(60));
        assert_eq!(inner.deadline(), outer.deadline());
    }
}
