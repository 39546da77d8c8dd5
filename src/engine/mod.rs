// src/engine/mod.rs

//! Step sequencing.
//!
//! - [`step`] defines [`Step`] and the [`Action`] trait actions implement.
//! - [`sequencer`] holds the [`Orchestrator`], which runs steps in order
//!   against its own progress hub.

pub mod sequencer;
pub mod step;

pub use sequencer::{Orchestrator, OrchestratorChannels, OrchestratorOptions};
pub use step::{Action, ActionFuture, FnAction, Step, action_fn};
