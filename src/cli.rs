// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `clusterboot`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "clusterboot",
    version,
    about = "Bootstrap a cluster stack step by step with live progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the install plan (TOML).
    #[arg(long, value_name = "PATH", default_value = "Clusterboot.toml")]
    pub plan: String,

    /// Run only this target from the plan.
    #[arg(long, value_name = "NAME")]
    pub target: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CLUSTERBOOT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Print progress updates as JSON lines instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
