// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] provides [`CommandAction`], the shell-command step action.
//! - [`plan`] turns a validated plan's target into sequencer steps.

pub mod command;
pub mod plan;

pub use command::{CommandAction, OutputStream, ProgressSource};
pub use plan::steps_for_target;
