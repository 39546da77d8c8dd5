// src/config/mod.rs

//! Install plan loading and validation.
//!
//! - [`model`] holds the TOML-backed raw model and the validated plan.
//! - [`loader`] reads a plan from disk.
//! - [`validate`] turns a raw plan into a [`PlanFile`], parsing durations
//!   and compiling pattern regexes on the way.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    FactSettings, FactsSection, OrchestratorSection, OrchestratorSettings, PatternConfig, PlanFile,
    RawPlanFile, StepConfig, StepPlan, TargetConfig, TargetPlan,
};
