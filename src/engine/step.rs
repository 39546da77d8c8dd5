// src/engine/step.rs

//! Steps and the actions they run.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;

/// Boxed future returned by [`Action::run`].
pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Opaque unit of work executed by a step.
///
/// Implementations that start a subprocess or network call should bind it to
/// `ctx`; the sequencer itself only refuses to start new steps once the
/// context ends. An action that notices cancellation should return the
/// [`Cancellation`](crate::context::Cancellation) as its error.
pub trait Action: Send + Sync {
    fn run(&self, ctx: Context) -> ActionFuture<'_>;
}

/// Adapter turning an async closure into an [`Action`].
#[derive(Clone)]
pub struct FnAction<F> {
    f: F,
}

/// Wrap `f` as an [`Action`].
pub fn action_fn<F, Fut>(f: F) -> FnAction<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnAction { f }
}

impl<F, Fut> Action for FnAction<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn run(&self, ctx: Context) -> ActionFuture<'_> {
        Box::pin((self.f)(ctx))
    }
}

/// A named unit of work with the progress value published when it starts.
#[derive(Clone)]
pub struct Step {
    pub description: String,
    pub target_progress: f64,
    pub action: Arc<dyn Action>,
}

impl Step {
    pub fn new(
        description: impl Into<String>,
        target_progress: f64,
        action: impl Action + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            target_progress,
            action: Arc::new(action),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("description", &self.description)
            .field("target_progress", &self.target_progress)
            .finish_non_exhaustive()
    }
}
