// src/errors.rs

//! Crate-wide error type and aliases.

use thiserror::Error;

use crate::context::Cancellation;

#[derive(Error, Debug)]
pub enum BootError {
    /// The run context was canceled or its deadline passed.
    ///
    /// Always surfaced as-is so callers can tell operator cancellation apart
    /// from a genuine step failure.
    #[error(transparent)]
    Canceled(#[from] Cancellation),

    /// A step's action returned an error.
    #[error("step {index}/{total} ({description}) failed: {source}")]
    StepFailed {
        index: usize,
        total: usize,
        description: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BootError {
    /// True for `Canceled`, i.e. the run was stopped rather than broken.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BootError::Canceled(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BootError>;
