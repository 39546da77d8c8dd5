// src/progress/mod.rs

//! Progress tracking and publication.
//!
//! - [`state`] defines the per-target record, updates and snapshots.
//! - [`book`] is the pure store that applies updates to state.
//! - [`hub`] is the single-writer actor that owns the book and publishes
//!   snapshots to the consumer.
//! - [`interpolator`] synthesises progress while a step blocks.
//! - [`classifier`] turns tool output into real progress values.

pub mod book;
pub mod classifier;
pub mod hub;
pub mod interpolator;
pub mod state;

pub use book::ProgressBook;
pub use classifier::{OutputClassifier, PatternClassifier, SignalTracker};
pub use hub::{ProgressHandle, ProgressReporter, spawn_hub};
pub use interpolator::{InterpolationSpec, Interpolator, InterpolatorGuard};
pub use state::{ProgressState, ProgressUpdate, TargetState, UpdateMessage};
